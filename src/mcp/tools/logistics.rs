//! Carriers, shipping manifests and shipments.

use crate::erp::Record;
use crate::mcp::args::ToolArgs;
use crate::mcp::context::ToolContext;
use crate::mcp::registry::{HandlerTable, ToolResult};

pub fn register_tools(handlers: &mut HandlerTable) {
    handlers.register("tiny_transportadoras_pesquisar", search_carriers);
    handlers.register("tiny_transportadora_obter", get_carrier);

    handlers.register("tiny_manifestos_pesquisar", |ctx, args| {
        search(ctx, args, Record::Manifest)
    });
    handlers.register("tiny_manifesto_obter", |ctx, args| {
        get(ctx, args, Record::Manifest)
    });
    handlers.register("tiny_expedicoes_pesquisar", |ctx, args| {
        search(ctx, args, Record::Shipment)
    });
    handlers.register("tiny_expedicao_obter", |ctx, args| {
        get(ctx, args, Record::Shipment)
    });
}

async fn search_carriers(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .search_carriers(&args.text_or("pagina", "1"))
        .await
}

async fn get_carrier(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client.get_carrier(&args.text("id")).await
}

async fn search(ctx: ToolContext, args: ToolArgs, record: Record) -> ToolResult {
    ctx.client
        .search_records(record, &args.text_or("pagina", "1"))
        .await
}

async fn get(ctx: ToolContext, args: ToolArgs, record: Record) -> ToolResult {
    ctx.client.get_record(record, &args.text("id")).await
}
