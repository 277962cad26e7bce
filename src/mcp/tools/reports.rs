//! Sales and stock reports.

use crate::mcp::args::ToolArgs;
use crate::mcp::context::ToolContext;
use crate::mcp::registry::{HandlerTable, ToolResult};

pub fn register_tools(handlers: &mut HandlerTable) {
    handlers.register("tiny_relatorio_vendas", sales_report);
    handlers.register("tiny_relatorio_produtos_mais_vendidos", best_sellers_report);
    handlers.register("tiny_relatorio_estoque_baixo", low_stock_report);
}

async fn sales_report(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .sales_report(
            &args.text("data_inicio"),
            &args.text("data_fim"),
            &args.text_or("tipo", "geral"),
        )
        .await
}

async fn best_sellers_report(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .best_sellers_report(
            &args.text("data_inicio"),
            &args.text("data_fim"),
            &args.text_or("limite", "10"),
        )
        .await
}

async fn low_stock_report(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .low_stock_report(&args.text_or("minimo", "5"))
        .await
}
