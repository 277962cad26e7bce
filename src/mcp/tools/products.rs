//! Products, stock levels, prices and kits.

use crate::erp::Record;
use crate::mcp::args::ToolArgs;
use crate::mcp::context::ToolContext;
use crate::mcp::registry::{HandlerTable, ToolResult};

pub fn register_tools(handlers: &mut HandlerTable) {
    handlers.register("tiny_produtos_pesquisar", search_products);
    handlers.register("tiny_produto_obter", get_product);
    handlers.register("tiny_produto_incluir", create_product);
    handlers.register("tiny_produto_alterar", update_product);
    handlers.register("tiny_produto_obter_estoque", get_product_stock);
    handlers.register("tiny_produto_atualizar_estoque", update_product_stock);
    handlers.register("tiny_produto_obter_preco", get_product_price);

    handlers.register("tiny_kits_pesquisar", search_kits);
    handlers.register("tiny_kit_obter", get_kit);
}

async fn search_products(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .search_products(
            &args.text("pesquisa"),
            &args.text_or("pagina", "1"),
            &args.text_or("situacao", "A"),
            args.optional("gtin").as_deref(),
        )
        .await
}

async fn get_product(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client.get_product(&args.text("id")).await
}

async fn create_product(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    let product = args.nested("produto")?;
    ctx.client.create_product(product).await
}

async fn update_product(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    let product = args.nested("produto")?;
    ctx.client.update_product(&args.text("id"), product).await
}

async fn get_product_stock(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client.get_product_stock(&args.text("id")).await
}

async fn update_product_stock(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .update_product_stock(&args.text("id"), &args.text("estoque"))
        .await
}

async fn get_product_price(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client.get_product_price(&args.text("id")).await
}

async fn search_kits(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .search_records(Record::Kit, &args.text_or("pagina", "1"))
        .await
}

async fn get_kit(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client.get_record(Record::Kit, &args.text("id")).await
}
