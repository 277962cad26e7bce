//! Fiscal invoices (notas fiscais).

use crate::mcp::args::ToolArgs;
use crate::mcp::context::ToolContext;
use crate::mcp::registry::{HandlerTable, ToolResult};

pub fn register_tools(handlers: &mut HandlerTable) {
    handlers.register("tiny_notas_fiscais_pesquisar", search_invoices);
    handlers.register("tiny_nota_fiscal_obter", get_invoice);
    handlers.register("tiny_nota_fiscal_incluir", create_invoice);
    handlers.register("tiny_nota_fiscal_gerar_pedido", generate_from_order);
    handlers.register("tiny_nota_fiscal_enviar_email", email_invoice);
    handlers.register("tiny_nota_fiscal_obter_xml", get_invoice_xml);
    handlers.register("tiny_nota_fiscal_cancelar", cancel_invoice);
}

async fn search_invoices(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .search_invoices(
            &args.text("pesquisa"),
            &args.text_or("pagina", "1"),
            args.optional("data_inicio").as_deref(),
            args.optional("data_fim").as_deref(),
        )
        .await
}

async fn get_invoice(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client.get_invoice(&args.text("id")).await
}

async fn create_invoice(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    let invoice = args.nested("nota")?;
    ctx.client.create_invoice(invoice).await
}

async fn generate_from_order(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .generate_invoice_from_order(&args.text("pedido_id"))
        .await
}

async fn email_invoice(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .email_invoice(&args.text("id"), &args.text("email"))
        .await
}

async fn get_invoice_xml(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client.get_invoice_xml(&args.text("id")).await
}

async fn cancel_invoice(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .cancel_invoice(&args.text("id"), &args.text("motivo"))
        .await
}
