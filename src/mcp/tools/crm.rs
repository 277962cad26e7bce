//! CRM opportunities.

use crate::mcp::args::ToolArgs;
use crate::mcp::context::ToolContext;
use crate::mcp::registry::{HandlerTable, ToolResult};

pub fn register_tools(handlers: &mut HandlerTable) {
    handlers.register("tiny_crm_oportunidades_pesquisar", search_opportunities);
    handlers.register("tiny_crm_oportunidade_obter", get_opportunity);
    handlers.register("tiny_crm_oportunidade_incluir", create_opportunity);
    handlers.register("tiny_crm_oportunidade_alterar", update_opportunity);
}

async fn search_opportunities(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .search_opportunities(&args.text_or("pagina", "1"))
        .await
}

async fn get_opportunity(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client.get_opportunity(&args.text("id")).await
}

async fn create_opportunity(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    let opportunity = args.nested("oportunidade")?;
    ctx.client.create_opportunity(opportunity).await
}

async fn update_opportunity(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    let opportunity = args.nested("oportunidade")?;
    ctx.client
        .update_opportunity(&args.text("id"), opportunity)
        .await
}
