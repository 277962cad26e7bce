//! Warehouses, stock movements and product classification.

use crate::mcp::args::ToolArgs;
use crate::mcp::context::ToolContext;
use crate::mcp::registry::{HandlerTable, ToolResult};

pub fn register_tools(handlers: &mut HandlerTable) {
    handlers.register("tiny_depositos_listar", list_warehouses);
    handlers.register("tiny_deposito_obter_estoque", get_warehouse_stock);
    handlers.register("tiny_movimentacoes_estoque_pesquisar", search_stock_movements);
    handlers.register("tiny_movimentacao_estoque_incluir", create_stock_movement);
    handlers.register("tiny_categorias_listar", list_categories);
    handlers.register("tiny_etiquetas_listar", list_tags);
}

async fn list_warehouses(ctx: ToolContext, _args: ToolArgs) -> ToolResult {
    ctx.client.list_warehouses().await
}

async fn get_warehouse_stock(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client.get_warehouse_stock(&args.text("id")).await
}

async fn search_stock_movements(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .search_stock_movements(
            &args.text_or("pagina", "1"),
            args.optional("produto_id").as_deref(),
            args.optional("data_inicio").as_deref(),
            args.optional("data_fim").as_deref(),
        )
        .await
}

async fn create_stock_movement(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    let movement = args.nested("movimentacao")?;
    ctx.client.create_stock_movement(movement).await
}

async fn list_categories(ctx: ToolContext, _args: ToolArgs) -> ToolResult {
    ctx.client.list_categories().await
}

async fn list_tags(ctx: ToolContext, _args: ToolArgs) -> ToolResult {
    ctx.client.list_tags().await
}
