//! Sales orders, quotes, purchase orders and service orders.

use crate::erp::Record;
use crate::mcp::args::ToolArgs;
use crate::mcp::context::ToolContext;
use crate::mcp::registry::{HandlerTable, ToolResult};

pub fn register_tools(handlers: &mut HandlerTable) {
    handlers.register("tiny_pedidos_pesquisar", search_orders);
    handlers.register("tiny_pedido_obter", get_order);
    handlers.register("tiny_pedido_incluir", create_order);
    handlers.register("tiny_pedido_alterar", update_order);
    handlers.register("tiny_pedido_alterar_situacao", update_order_status);
    handlers.register("tiny_pedido_obter_rastreamento", get_order_tracking);

    handlers.register("tiny_orcamentos_pesquisar", search_quotes);
    handlers.register("tiny_orcamento_obter", get_quote);
    handlers.register("tiny_orcamento_incluir", create_quote);

    handlers.register("tiny_pedidos_compra_pesquisar", search_purchase_orders);
    handlers.register("tiny_pedido_compra_obter", get_purchase_order);
    handlers.register("tiny_pedido_compra_incluir", create_purchase_order);

    handlers.register("tiny_ordens_servico_pesquisar", search_service_orders);
    handlers.register("tiny_ordem_servico_obter", get_service_order);
}

async fn search_orders(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .search_orders(
            &args.text("pesquisa"),
            &args.text_or("pagina", "1"),
            args.optional("data_inicio").as_deref(),
            args.optional("data_fim").as_deref(),
        )
        .await
}

async fn get_order(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client.get_order(&args.text("id")).await
}

async fn create_order(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    let order = args.nested("pedido")?;
    ctx.client.create_order(order).await
}

async fn update_order(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    let order = args.nested("pedido")?;
    ctx.client.update_order(&args.text("id"), order).await
}

async fn update_order_status(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .update_order_status(&args.text("id"), &args.text("situacao"))
        .await
}

async fn get_order_tracking(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client.get_order_tracking(&args.text("id")).await
}

async fn search_quotes(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .search_quotes(&args.text("pesquisa"), &args.text_or("pagina", "1"))
        .await
}

async fn get_quote(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client.get_quote(&args.text("id")).await
}

async fn create_quote(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    let quote = args.nested("orcamento")?;
    ctx.client.create_quote(quote).await
}

async fn search_purchase_orders(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .search_purchase_orders(&args.text_or("pagina", "1"))
        .await
}

async fn get_purchase_order(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client.get_purchase_order(&args.text("id")).await
}

async fn create_purchase_order(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    let order = args.nested("pedido")?;
    ctx.client.create_purchase_order(order).await
}

async fn search_service_orders(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .search_records(Record::ServiceOrder, &args.text_or("pagina", "1"))
        .await
}

async fn get_service_order(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .get_record(Record::ServiceOrder, &args.text("id"))
        .await
}
