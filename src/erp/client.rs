//! Typed client for the Tiny ERP v2 API.
//!
//! Every ERP operation is one method building a [`FormPayload`]. Nested
//! resources are handed over as [`NestedPayload`] and stringified inside the
//! operation method, the only place they are encoded.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::codec::{encode, EncodedJson, NestedPayload};
use super::transport::UpstreamTransport;
use super::ErpError;

/// Response format requested from every endpoint.
pub const RESPONSE_FORMAT: &str = "JSON";

/// A form field value. Structured data only enters as [`EncodedJson`].
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    Json(EncodedJson),
}

impl FormValue {
    pub fn as_str(&self) -> &str {
        match self {
            FormValue::Text(text) => text,
            FormValue::Json(json) => json.as_str(),
        }
    }
}

/// Operation-specific form fields, in wire order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormPayload {
    fields: Vec<(&'static str, FormValue)>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.fields.push((name, FormValue::Text(value.into())));
        self
    }

    /// Adds the field only when a value is present.
    pub fn opt_text(self, name: &'static str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.text(name, value),
            None => self,
        }
    }

    pub fn json(mut self, name: &'static str, value: EncodedJson) -> Self {
        self.fields.push((name, FormValue::Json(value)));
        self
    }

    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.fields
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    /// Complete wire form: credential, response format, then the operation fields.
    pub fn into_form(self, token: &str) -> Vec<(String, String)> {
        let mut form = Vec::with_capacity(self.fields.len() + 2);
        form.push(("token".to_string(), token.to_string()));
        form.push(("formato".to_string(), RESPONSE_FORMAT.to_string()));
        form.extend(self.fields.into_iter().map(|(name, value)| {
            let value = match value {
                FormValue::Text(text) => text,
                FormValue::Json(json) => json.into_string(),
            };
            (name.to_string(), value)
        }));
        form
    }
}

/// Tiny ERP client bound to one tenant credential.
#[derive(Clone)]
pub struct TinyClient {
    transport: Arc<dyn UpstreamTransport>,
    token: String,
}

impl fmt::Debug for TinyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TinyClient")
            .field("token", &"***")
            .finish_non_exhaustive()
    }
}

fn nested(name: &'static str, payload: NestedPayload) -> FormPayload {
    FormPayload::new().json(name, encode(payload))
}

fn by_id(id: &str) -> FormPayload {
    FormPayload::new().text("id", id)
}

fn page(pagina: &str) -> FormPayload {
    FormPayload::new().text("pagina", pagina)
}

impl TinyClient {
    pub fn new(transport: Arc<dyn UpstreamTransport>, token: impl Into<String>) -> Self {
        Self {
            transport,
            token: token.into(),
        }
    }

    /// Generic primitive: one POST to `endpoint`. Never touches field nesting.
    pub async fn request(&self, endpoint: &str, payload: FormPayload) -> Result<Value, ErpError> {
        self.transport
            .post_form(endpoint, payload.into_form(&self.token))
            .await
    }

    /// Form sent by [`TinyClient::create_order`].
    pub fn order_form(order: NestedPayload) -> FormPayload {
        nested("pedido", order)
    }

    // ========================================================================
    // Orders
    // ========================================================================

    pub async fn search_orders(
        &self,
        pesquisa: &str,
        pagina: &str,
        data_inicio: Option<&str>,
        data_fim: Option<&str>,
    ) -> Result<Value, ErpError> {
        let form = FormPayload::new()
            .text("pesquisa", pesquisa)
            .text("pagina", pagina)
            .opt_text("dataInicio", data_inicio)
            .opt_text("dataFim", data_fim);
        self.request("pedidos.pesquisa", form).await
    }

    pub async fn get_order(&self, id: &str) -> Result<Value, ErpError> {
        self.request("pedido.obter", by_id(id)).await
    }

    pub async fn create_order(&self, order: NestedPayload) -> Result<Value, ErpError> {
        self.request("pedido.incluir", Self::order_form(order)).await
    }

    pub async fn update_order(&self, id: &str, order: NestedPayload) -> Result<Value, ErpError> {
        let form = by_id(id).json("pedido", encode(order));
        self.request("pedido.alterar", form).await
    }

    pub async fn update_order_status(&self, id: &str, situacao: &str) -> Result<Value, ErpError> {
        let form = by_id(id).text("situacao", situacao);
        self.request("pedido.alterar.situacao", form).await
    }

    pub async fn get_order_tracking(&self, id: &str) -> Result<Value, ErpError> {
        self.request("pedido.obter.rastreamento", by_id(id)).await
    }

    // ========================================================================
    // Products
    // ========================================================================

    pub async fn search_products(
        &self,
        pesquisa: &str,
        pagina: &str,
        situacao: &str,
        gtin: Option<&str>,
    ) -> Result<Value, ErpError> {
        let form = FormPayload::new()
            .text("pesquisa", pesquisa)
            .text("pagina", pagina)
            .text("situacao", situacao)
            .opt_text("gtin", gtin);
        self.request("produtos.pesquisa", form).await
    }

    pub async fn get_product(&self, id: &str) -> Result<Value, ErpError> {
        self.request("produto.obter", by_id(id)).await
    }

    pub async fn create_product(&self, product: NestedPayload) -> Result<Value, ErpError> {
        self.request("produto.incluir", nested("produto", product))
            .await
    }

    pub async fn update_product(
        &self,
        id: &str,
        product: NestedPayload,
    ) -> Result<Value, ErpError> {
        let form = by_id(id).json("produto", encode(product));
        self.request("produto.alterar", form).await
    }

    pub async fn get_product_stock(&self, id: &str) -> Result<Value, ErpError> {
        self.request("produto.obter.estoque", by_id(id)).await
    }

    pub async fn update_product_stock(&self, id: &str, estoque: &str) -> Result<Value, ErpError> {
        let form = by_id(id).text("estoque", estoque);
        self.request("produto.atualizar.estoque", form).await
    }

    pub async fn get_product_price(&self, id: &str) -> Result<Value, ErpError> {
        self.request("produto.obter.preco", by_id(id)).await
    }

    // ========================================================================
    // Contacts
    // ========================================================================

    pub async fn search_contacts(
        &self,
        pesquisa: &str,
        pagina: &str,
        tipo_pessoa: Option<&str>,
    ) -> Result<Value, ErpError> {
        let form = FormPayload::new()
            .text("pesquisa", pesquisa)
            .text("pagina", pagina)
            .opt_text("tipoPessoa", tipo_pessoa);
        self.request("contatos.pesquisa", form).await
    }

    pub async fn get_contact(&self, id: &str) -> Result<Value, ErpError> {
        self.request("contato.obter", by_id(id)).await
    }

    pub async fn create_contact(&self, contact: NestedPayload) -> Result<Value, ErpError> {
        self.request("contato.incluir", nested("contato", contact))
            .await
    }

    pub async fn update_contact(
        &self,
        id: &str,
        contact: NestedPayload,
    ) -> Result<Value, ErpError> {
        let form = by_id(id).json("contato", encode(contact));
        self.request("contato.alterar", form).await
    }

    // ========================================================================
    // Invoices (notas fiscais)
    // ========================================================================

    pub async fn search_invoices(
        &self,
        pesquisa: &str,
        pagina: &str,
        data_inicio: Option<&str>,
        data_fim: Option<&str>,
    ) -> Result<Value, ErpError> {
        let form = FormPayload::new()
            .text("pesquisa", pesquisa)
            .text("pagina", pagina)
            .opt_text("dataInicio", data_inicio)
            .opt_text("dataFim", data_fim);
        self.request("notas.fiscais.pesquisa", form).await
    }

    pub async fn get_invoice(&self, id: &str) -> Result<Value, ErpError> {
        self.request("nota.fiscal.obter", by_id(id)).await
    }

    pub async fn create_invoice(&self, invoice: NestedPayload) -> Result<Value, ErpError> {
        self.request("nota.fiscal.incluir", nested("nota", invoice))
            .await
    }

    pub async fn generate_invoice_from_order(&self, pedido_id: &str) -> Result<Value, ErpError> {
        let form = FormPayload::new().text("idPedido", pedido_id);
        self.request("nota.fiscal.gerar.pedido", form).await
    }

    pub async fn email_invoice(&self, id: &str, email: &str) -> Result<Value, ErpError> {
        let form = by_id(id).text("email", email);
        self.request("nota.fiscal.enviar.email", form).await
    }

    pub async fn get_invoice_xml(&self, id: &str) -> Result<Value, ErpError> {
        self.request("nota.fiscal.obter.xml", by_id(id)).await
    }

    pub async fn cancel_invoice(&self, id: &str, motivo: &str) -> Result<Value, ErpError> {
        let form = by_id(id).text("motivo", motivo);
        self.request("nota.fiscal.cancelar", form).await
    }

    // ========================================================================
    // Receivables and payables
    // ========================================================================

    pub async fn search_accounts(
        &self,
        kind: AccountKind,
        pagina: &str,
        data_inicio: Option<&str>,
        data_fim: Option<&str>,
        situacao: Option<&str>,
    ) -> Result<Value, ErpError> {
        let form = page(pagina)
            .opt_text("dataInicio", data_inicio)
            .opt_text("dataFim", data_fim)
            .opt_text("situacao", situacao);
        self.request(kind.search_endpoint(), form).await
    }

    pub async fn get_account(&self, kind: AccountKind, id: &str) -> Result<Value, ErpError> {
        self.request(kind.get_endpoint(), by_id(id)).await
    }

    pub async fn create_account(
        &self,
        kind: AccountKind,
        account: NestedPayload,
    ) -> Result<Value, ErpError> {
        self.request(kind.create_endpoint(), nested("conta", account))
            .await
    }

    pub async fn settle_account(
        &self,
        kind: AccountKind,
        id: &str,
        data_pagamento: &str,
        valor: &str,
    ) -> Result<Value, ErpError> {
        let form = by_id(id)
            .text("dataPagamento", data_pagamento)
            .text("valor", valor);
        self.request(kind.settle_endpoint(), form).await
    }

    // ========================================================================
    // CRM
    // ========================================================================

    pub async fn search_opportunities(&self, pagina: &str) -> Result<Value, ErpError> {
        self.request("crm.oportunidades.pesquisa", page(pagina))
            .await
    }

    pub async fn get_opportunity(&self, id: &str) -> Result<Value, ErpError> {
        self.request("crm.oportunidade.obter", by_id(id)).await
    }

    pub async fn create_opportunity(&self, opportunity: NestedPayload) -> Result<Value, ErpError> {
        self.request(
            "crm.oportunidade.incluir",
            nested("oportunidade", opportunity),
        )
        .await
    }

    pub async fn update_opportunity(
        &self,
        id: &str,
        opportunity: NestedPayload,
    ) -> Result<Value, ErpError> {
        let form = by_id(id).json("oportunidade", encode(opportunity));
        self.request("crm.oportunidade.alterar", form).await
    }

    // ========================================================================
    // Reference data
    // ========================================================================

    pub async fn list_payment_methods(&self) -> Result<Value, ErpError> {
        self.request("formas.pagamento.lista", FormPayload::new())
            .await
    }

    pub async fn search_carriers(&self, pagina: &str) -> Result<Value, ErpError> {
        self.request("transportadoras.pesquisa", page(pagina)).await
    }

    pub async fn get_carrier(&self, id: &str) -> Result<Value, ErpError> {
        self.request("transportadora.obter", by_id(id)).await
    }

    pub async fn search_sellers(&self, pagina: &str) -> Result<Value, ErpError> {
        self.request("vendedores.pesquisa", page(pagina)).await
    }

    pub async fn get_seller(&self, id: &str) -> Result<Value, ErpError> {
        self.request("vendedor.obter", by_id(id)).await
    }

    pub async fn list_categories(&self) -> Result<Value, ErpError> {
        self.request("categorias.lista", FormPayload::new()).await
    }

    pub async fn list_tags(&self) -> Result<Value, ErpError> {
        self.request("etiquetas.lista", FormPayload::new()).await
    }

    pub async fn list_warehouses(&self) -> Result<Value, ErpError> {
        self.request("depositos.lista", FormPayload::new()).await
    }

    pub async fn get_warehouse_stock(&self, id: &str) -> Result<Value, ErpError> {
        self.request("deposito.obter.estoque", by_id(id)).await
    }

    pub async fn get_account_info(&self) -> Result<Value, ErpError> {
        self.request("info", FormPayload::new()).await
    }

    pub async fn list_custom_fields(&self, modulo: &str) -> Result<Value, ErpError> {
        let form = FormPayload::new().text("modulo", modulo);
        self.request("campos.personalizados.lista", form).await
    }

    // ========================================================================
    // Quotes and purchase orders
    // ========================================================================

    pub async fn search_quotes(&self, pesquisa: &str, pagina: &str) -> Result<Value, ErpError> {
        let form = FormPayload::new()
            .text("pesquisa", pesquisa)
            .text("pagina", pagina);
        self.request("orcamentos.pesquisa", form).await
    }

    pub async fn get_quote(&self, id: &str) -> Result<Value, ErpError> {
        self.request("orcamento.obter", by_id(id)).await
    }

    pub async fn create_quote(&self, quote: NestedPayload) -> Result<Value, ErpError> {
        self.request("orcamento.incluir", nested("orcamento", quote))
            .await
    }

    pub async fn search_purchase_orders(&self, pagina: &str) -> Result<Value, ErpError> {
        self.request("pedidos.compra.pesquisa", page(pagina)).await
    }

    pub async fn get_purchase_order(&self, id: &str) -> Result<Value, ErpError> {
        self.request("pedido.compra.obter", by_id(id)).await
    }

    pub async fn create_purchase_order(&self, order: NestedPayload) -> Result<Value, ErpError> {
        self.request("pedido.compra.incluir", nested("pedido", order))
            .await
    }

    // ========================================================================
    // Logistics, service orders, kits, point of sale
    // ========================================================================

    /// Paged search on one of the simple `<plural>.pesquisa` endpoints.
    pub async fn search_records(&self, record: Record, pagina: &str) -> Result<Value, ErpError> {
        self.request(record.search_endpoint(), page(pagina)).await
    }

    pub async fn get_record(&self, record: Record, id: &str) -> Result<Value, ErpError> {
        self.request(record.get_endpoint(), by_id(id)).await
    }

    // ========================================================================
    // Billing slips (boletos)
    // ========================================================================

    pub async fn generate_billing_slip(&self, conta_receber_id: &str) -> Result<Value, ErpError> {
        let form = FormPayload::new().text("idContaReceber", conta_receber_id);
        self.request("boleto.gerar", form).await
    }

    pub async fn get_billing_slip(&self, id: &str) -> Result<Value, ErpError> {
        self.request("boleto.obter", by_id(id)).await
    }

    // ========================================================================
    // Reports
    // ========================================================================

    pub async fn sales_report(
        &self,
        data_inicio: &str,
        data_fim: &str,
        tipo: &str,
    ) -> Result<Value, ErpError> {
        let form = FormPayload::new()
            .text("dataInicio", data_inicio)
            .text("dataFim", data_fim)
            .text("tipo", tipo);
        self.request("relatorio.vendas", form).await
    }

    pub async fn best_sellers_report(
        &self,
        data_inicio: &str,
        data_fim: &str,
        limite: &str,
    ) -> Result<Value, ErpError> {
        let form = FormPayload::new()
            .text("dataInicio", data_inicio)
            .text("dataFim", data_fim)
            .text("limite", limite);
        self.request("relatorio.produtos.mais.vendidos", form).await
    }

    pub async fn low_stock_report(&self, minimo: &str) -> Result<Value, ErpError> {
        let form = FormPayload::new().text("minimo", minimo);
        self.request("relatorio.estoque.baixo", form).await
    }

    // ========================================================================
    // Inventory movements
    // ========================================================================

    pub async fn search_stock_movements(
        &self,
        pagina: &str,
        produto_id: Option<&str>,
        data_inicio: Option<&str>,
        data_fim: Option<&str>,
    ) -> Result<Value, ErpError> {
        let form = page(pagina)
            .opt_text("idProduto", produto_id)
            .opt_text("dataInicio", data_inicio)
            .opt_text("dataFim", data_fim);
        self.request("movimentacoes.estoque.pesquisa", form).await
    }

    pub async fn create_stock_movement(&self, movement: NestedPayload) -> Result<Value, ErpError> {
        self.request(
            "movimentacao.estoque.incluir",
            nested("movimentacao", movement),
        )
        .await
    }

    // ========================================================================
    // Webhooks, integrations, marketplaces
    // ========================================================================

    pub async fn list_webhooks(&self) -> Result<Value, ErpError> {
        self.request("webhooks.lista", FormPayload::new()).await
    }

    pub async fn register_webhook(&self, url: &str, eventos: NestedPayload) -> Result<Value, ErpError> {
        let form = FormPayload::new()
            .text("url", url)
            .json("eventos", encode(eventos));
        self.request("webhook.cadastrar", form).await
    }

    pub async fn remove_webhook(&self, id: &str) -> Result<Value, ErpError> {
        self.request("webhook.remover", by_id(id)).await
    }

    pub async fn list_integrations(&self) -> Result<Value, ErpError> {
        self.request("integracoes.lista", FormPayload::new()).await
    }

    pub async fn get_api_logs(
        &self,
        pagina: &str,
        data_inicio: Option<&str>,
        data_fim: Option<&str>,
    ) -> Result<Value, ErpError> {
        let form = page(pagina)
            .opt_text("dataInicio", data_inicio)
            .opt_text("dataFim", data_fim);
        self.request("logs.api", form).await
    }

    pub async fn list_marketplaces(&self) -> Result<Value, ErpError> {
        self.request("marketplaces.lista", FormPayload::new()).await
    }

    pub async fn sync_marketplace(&self, marketplace: &str) -> Result<Value, ErpError> {
        let form = FormPayload::new().text("marketplace", marketplace);
        self.request("marketplace.sincronizar", form).await
    }
}

/// Receivable or payable account book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Receivable,
    Payable,
}

impl AccountKind {
    fn search_endpoint(self) -> &'static str {
        match self {
            AccountKind::Receivable => "contas.receber.pesquisa",
            AccountKind::Payable => "contas.pagar.pesquisa",
        }
    }

    fn get_endpoint(self) -> &'static str {
        match self {
            AccountKind::Receivable => "conta.receber.obter",
            AccountKind::Payable => "conta.pagar.obter",
        }
    }

    fn create_endpoint(self) -> &'static str {
        match self {
            AccountKind::Receivable => "conta.receber.incluir",
            AccountKind::Payable => "conta.pagar.incluir",
        }
    }

    fn settle_endpoint(self) -> &'static str {
        match self {
            AccountKind::Receivable => "conta.receber.baixar",
            AccountKind::Payable => "conta.pagar.baixar",
        }
    }
}

/// Record types exposed through a plain paged search and a get-by-id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record {
    Manifest,
    ServiceOrder,
    Kit,
    Shipment,
    PosSale,
}

impl Record {
    fn search_endpoint(self) -> &'static str {
        match self {
            Record::Manifest => "manifestos.pesquisa",
            Record::ServiceOrder => "ordens.servico.pesquisa",
            Record::Kit => "kits.pesquisa",
            Record::Shipment => "expedicoes.pesquisa",
            Record::PosSale => "pdv.vendas.pesquisa",
        }
    }

    fn get_endpoint(self) -> &'static str {
        match self {
            Record::Manifest => "manifesto.obter",
            Record::ServiceOrder => "ordem.servico.obter",
            Record::Kit => "kit.obter",
            Record::Shipment => "expedicao.obter",
            Record::PosSale => "pdv.venda.obter",
        }
    }
}
