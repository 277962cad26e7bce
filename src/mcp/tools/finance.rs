//! Receivables, payables, billing slips and payment methods.

use crate::erp::AccountKind;
use crate::mcp::args::ToolArgs;
use crate::mcp::context::ToolContext;
use crate::mcp::registry::{HandlerTable, ToolResult};

pub fn register_tools(handlers: &mut HandlerTable) {
    handlers.register("tiny_contas_receber_pesquisar", |ctx, args| {
        search_accounts(ctx, args, AccountKind::Receivable)
    });
    handlers.register("tiny_conta_receber_obter", |ctx, args| {
        get_account(ctx, args, AccountKind::Receivable)
    });
    handlers.register("tiny_conta_receber_incluir", |ctx, args| {
        create_account(ctx, args, AccountKind::Receivable)
    });
    handlers.register("tiny_conta_receber_baixar", |ctx, args| {
        settle_account(ctx, args, AccountKind::Receivable)
    });

    handlers.register("tiny_contas_pagar_pesquisar", |ctx, args| {
        search_accounts(ctx, args, AccountKind::Payable)
    });
    handlers.register("tiny_conta_pagar_obter", |ctx, args| {
        get_account(ctx, args, AccountKind::Payable)
    });
    handlers.register("tiny_conta_pagar_incluir", |ctx, args| {
        create_account(ctx, args, AccountKind::Payable)
    });
    handlers.register("tiny_conta_pagar_baixar", |ctx, args| {
        settle_account(ctx, args, AccountKind::Payable)
    });

    handlers.register("tiny_boleto_gerar", generate_billing_slip);
    handlers.register("tiny_boleto_obter", get_billing_slip);
    handlers.register("tiny_formas_pagamento_listar", list_payment_methods);
}

async fn search_accounts(ctx: ToolContext, args: ToolArgs, kind: AccountKind) -> ToolResult {
    ctx.client
        .search_accounts(
            kind,
            &args.text_or("pagina", "1"),
            args.optional("data_inicio").as_deref(),
            args.optional("data_fim").as_deref(),
            args.optional("situacao").as_deref(),
        )
        .await
}

async fn get_account(ctx: ToolContext, args: ToolArgs, kind: AccountKind) -> ToolResult {
    ctx.client.get_account(kind, &args.text("id")).await
}

async fn create_account(ctx: ToolContext, args: ToolArgs, kind: AccountKind) -> ToolResult {
    let account = args.nested("conta")?;
    ctx.client.create_account(kind, account).await
}

async fn settle_account(ctx: ToolContext, args: ToolArgs, kind: AccountKind) -> ToolResult {
    ctx.client
        .settle_account(
            kind,
            &args.text("id"),
            &args.text("data_pagamento"),
            &args.text("valor"),
        )
        .await
}

async fn generate_billing_slip(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client
        .generate_billing_slip(&args.text("conta_receber_id"))
        .await
}

async fn get_billing_slip(ctx: ToolContext, args: ToolArgs) -> ToolResult {
    ctx.client.get_billing_slip(&args.text("id")).await
}

async fn list_payment_methods(ctx: ToolContext, _args: ToolArgs) -> ToolResult {
    ctx.client.list_payment_methods().await
}
