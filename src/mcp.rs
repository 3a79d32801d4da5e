use std::sync::Arc;

use rmcp::{
    ServerHandler,
    ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult,
        Content,
        Implementation,
        ServerCapabilities,
        ServerInfo,
    },
    tool,
    tool_handler,
    tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    catalog::CatalogDb,
    code,
    error,
    output,
    resolver,
    search::{self, SearchMode},
};

struct CodecoverState {
    catalog: CatalogDb,
}

#[derive(Clone)]
pub struct CodecoverMcpServer {
    state: Arc<CodecoverState>,
    tool_router: ToolRouter<Self>,
}

impl CodecoverMcpServer {
    fn new(state: CodecoverState) -> Self {
        Self {
            state: Arc::new(state),
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router(router = tool_router)]
impl CodecoverMcpServer {
    /// Pick the fewest documents covering a list of codes.
    #[tool(
        name = "codecover_cover",
        description = "Given a list of part codes, return a small set of documents that together cover as many of them as possible, plus the codes no document carries."
    )]
    pub async fn codecover_cover(
        &self,
        params: Parameters<CoverParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        if code::normalize(&params.codes).is_empty() {
            return Err(rmcp::ErrorData::invalid_params(
                "no codes given",
                None,
            ));
        }

        let resolution =
            resolver::resolve_coverage(&self.state.catalog, &params.codes)
                .map_err(|e| mcp_error("coverage lookup failed", e))?;

        let summary = output::format_resolution(&resolution);
        let structured = serde_json::to_value(&resolution)
            .map_err(|e| mcp_error("failed to serialize coverage", e))?;

        let mut result = CallToolResult::success(vec![Content::text(summary)]);
        result.structured_content = Some(structured);
        Ok(result)
    }

    /// Autocomplete part codes.
    #[tool(
        name = "codecover_prefix",
        description = "List stored part codes starting with a prefix, in alphabetical order."
    )]
    pub async fn codecover_prefix(
        &self,
        params: Parameters<PrefixParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let limit = match params.limit {
            Some(limit) => limit,
            None => self
                .state
                .catalog
                .prefix_limit()
                .map_err(|e| mcp_error("invalid prefix_limit setting", e))?,
        };

        let codes =
            search::search_prefix(&self.state.catalog, &params.prefix, limit)
                .map_err(|e| mcp_error("prefix lookup failed", e))?;

        let summary = if codes.is_empty() {
            format!("No codes start with \"{}\"", params.prefix.trim())
        } else {
            output::format_codes(&codes)
        };

        let mut result = CallToolResult::success(vec![Content::text(summary)]);
        result.structured_content = Some(json!({
                "prefix": params.prefix,
                "codes": codes,
            }));
        Ok(result)
    }

    /// Find documents by one code.
    #[tool(
        name = "codecover_search",
        description = "Find documents by part code. Mode 'exact' matches whole codes; 'contains' (default) matches code fragments and document names."
    )]
    pub async fn codecover_search(
        &self,
        params: Parameters<SearchParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let mode = params.mode.unwrap_or_default();

        let documents =
            search::search_by_code(&self.state.catalog, &params.code, mode)
                .map_err(|e| mcp_error("search failed", e))?;

        let summary = output::format_documents(&documents);
        let structured = json!({
            "code": params.code,
            "mode": mode,
            "resultCount": documents.len(),
            "documents": documents,
        });

        let mut result = CallToolResult::success(vec![Content::text(summary)]);
        result.structured_content = Some(structured);
        Ok(result)
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for CodecoverMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_server_info(
                Implementation::new("codecover", env!("CARGO_PKG_VERSION"))
                    .with_title("codecover MCP"),
            )
            .with_instructions(
                "Use codecover_cover to find which documents to pull for a list of part codes. Use codecover_prefix to complete partial codes and codecover_search to look up a single code.",
            )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoverParams {
    /// Requested codes separated by commas, semicolons or whitespace.
    pub codes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrefixParams {
    /// Code prefix, case-insensitive.
    pub prefix: String,
    /// Maximum number of codes (default: the prefix_limit setting, 50).
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// Code or fragment to look for.
    pub code: String,
    /// "exact" or "contains" (default).
    pub mode: Option<SearchMode>,
}

fn mcp_error(message: &str, error: impl std::fmt::Display) -> rmcp::ErrorData {
    rmcp::ErrorData::internal_error(
        message.to_string(),
        Some(json!({ "error": error.to_string() })),
    )
}

pub fn run_mcp(catalog: CatalogDb) -> error::Result<()> {
    let server = CodecoverMcpServer::new(CodecoverState { catalog });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            error::Error::Config(format!("failed to start tokio runtime: {e}"))
        })?;

    runtime.block_on(async move {
        let transport = rmcp::transport::stdio();
        let running = server.serve(transport).await.map_err(|e| {
            error::Error::Config(format!(
                "MCP server initialization failed: {e}"
            ))
        })?;
        running.waiting().await.map_err(|e| {
            error::Error::Config(format!("MCP server error: {e}"))
        })?;
        Ok(())
    })
}
