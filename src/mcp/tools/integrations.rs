//! Webhooks, marketplaces, point of sale, API logs and account settings.

use crate::erp::Record;
use crate::mcp::args::ToolArgs;
use crate::mcp::context::ToolContext;
use crate::mcp::registry::{HandlerTable, ToolResult};

pub fn register_tools(handlers: &mut HandlerTable) {
    handlers.register("tiny_webhooks_listar", list_webhooks);
    handlers.register("tiny_webhook_cadastrar", register_webhook);
    handlers.register("tiny_webhook_remover", remove_webhook);
    handlers.register("tiny_integracoes_listar", list_integrations);
    handlers.register("tiny_logs_api_obter", get_api_logs);
    handlers.register("tiny_marketplaces_listar", list_marketplaces);
    handlers.register("tiny_marketplace_sincronizar", sync_marketplace);

    handlers.register("tiny_pdv_vendas_pesquisar", search_pos_sales);
    handlers.register("tiny_pdv_venda_obter", get_pos_sale);

    handlers.register("tiny_conta_obter_info", get_account_info);
    handlers.register("tiny_campos_personalizados_listar", list_custom_fields);
}

async fn list_webhooks(ctx: ToolContext, _args: ToolArgs) -> ToolResult {
    ctx.client.list_webhooks().await
}

async fn register_webhook(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    let events = args.nested("eventos")?;
    ctx.client.register_webhook(&args.text("url"), events).await
}

async fn remove_webhook(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client.remove_webhook(&args.text("id")).await
}

async fn list_integrations(ctx: ToolContext, _args: ToolArgs) -> ToolResult {
    ctx.client.list_integrations().await
}

async fn get_api_logs(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .get_api_logs(
            &args.text_or("pagina", "1"),
            args.optional("data_inicio").as_deref(),
            args.optional("data_fim").as_deref(),
        )
        .await
}

async fn list_marketplaces(ctx: ToolContext, _args: ToolArgs) -> ToolResult {
    ctx.client.list_marketplaces().await
}

async fn sync_marketplace(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .sync_marketplace(&args.text("marketplace"))
        .await
}

async fn search_pos_sales(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .search_records(Record::PosSale, &args.text_or("pagina", "1"))
        .await
}

async fn get_pos_sale(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .get_record(Record::PosSale, &args.text("id"))
        .await
}

async fn get_account_info(ctx: ToolContext, _args: ToolArgs) -> ToolResult {
    ctx.client.get_account_info().await
}

async fn list_custom_fields(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .list_custom_fields(&args.text("modulo"))
        .await
}
