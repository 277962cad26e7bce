//! Customers, suppliers and sellers.

use crate::mcp::args::ToolArgs;
use crate::mcp::context::ToolContext;
use crate::mcp::registry::{HandlerTable, ToolResult};

pub fn register_tools(handlers: &mut HandlerTable) {
    handlers.register("tiny_contatos_pesquisar", search_contacts);
    handlers.register("tiny_contato_obter", get_contact);
    handlers.register("tiny_contato_incluir", create_contact);
    handlers.register("tiny_contato_alterar", update_contact);

    handlers.register("tiny_vendedores_pesquisar", search_sellers);
    handlers.register("tiny_vendedor_obter", get_seller);
}

async fn search_contacts(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .search_contacts(
            &args.text("pesquisa"),
            &args.text_or("pagina", "1"),
            args.optional("tipo_pessoa").as_deref(),
        )
        .await
}

async fn get_contact(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client.get_contact(&args.text("id")).await
}

async fn create_contact(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    let contact = args.nested("contato")?;
    ctx.client.create_contact(contact).await
}

async fn update_contact(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    let contact = args.nested("contato")?;
    ctx.client.update_contact(&args.text("id"), contact).await
}

async fn search_sellers(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client.search_sellers(&args.text_or("pagina", "1")).await
}

async fn get_seller(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client.get_seller(&args.text("id")).await
}
