//! Per-request tool visibility.
//!
//! Filters are AND-composed: a tool is visible only if every filter allows it,
//! so no filter can re-include a tool another one hid and registration order
//! never changes the outcome. The listing hook and the call-authorization hook
//! evaluate the same chain, which keeps `tools/list` and `tools/call` in agreement.
use std::{fmt, sync::Arc};

use rmcp::model::ErrorData;
use serde_json::json;
use tracing::debug;

use crate::{
    lib::errors::{resolve_error_to_error_data, ResolveError, TOOL_UNAVAILABLE_ERROR},
    server::resolver::{ConfigSet, RequestContext},
};

mod descriptor;
pub mod standard;

pub use descriptor::{ToolDescriptor, ToolHints};
pub use standard::{
    standard_config_args, standard_filters, FilterDefaults, ModuleFilter,
    NoDestructiveToolsFilter, ReadonlyModeFilter, ToolExclusionFilter,
};

/// Read-only view handed to filters for a single request.
#[derive(Clone, Copy)]
pub struct FilterContext<'a> {
    config: &'a ConfigSet,
    request: &'a RequestContext,
}

impl<'a> FilterContext<'a> {
    pub fn new(config: &'a ConfigSet, request: &'a RequestContext) -> Self {
        Self { config, request }
    }

    pub fn config(&self) -> &'a ConfigSet {
        self.config
    }

    pub fn request(&self) -> &'a RequestContext {
        self.request
    }

    pub fn resolve(&self, name: &str) -> Result<String, ResolveError> {
        self.config.resolve(name, self.request)
    }

    pub fn resolve_flag(&self, name: &str) -> Result<bool, ResolveError> {
        self.config.resolve_flag(name, self.request)
    }

    pub fn resolve_list(&self, name: &str) -> Result<Vec<String>, ResolveError> {
        self.config.resolve_list(name, self.request)
    }
}

/// A visibility predicate. Returning `false` hides the tool from listings and
/// rejects calls to it for the current request.
pub trait ToolFilter: Send + Sync {
    /// Label used in server-side logs only.
    fn name(&self) -> &str;

    fn is_visible(&self, tool: &ToolDescriptor, ctx: &FilterContext<'_>)
        -> Result<bool, ResolveError>;
}

/// Adapter turning a closure into a [`ToolFilter`].
pub struct FnToolFilter<F> {
    name: String,
    predicate: F,
}

impl<F> ToolFilter for FnToolFilter<F>
where
    F: Fn(&ToolDescriptor, &FilterContext<'_>) -> Result<bool, ResolveError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn is_visible(
        &self,
        tool: &ToolDescriptor,
        ctx: &FilterContext<'_>,
    ) -> Result<bool, ResolveError> {
        (self.predicate)(tool, ctx)
    }
}

/// Wrap a closure as a shareable filter.
pub fn filter_fn<F>(name: impl Into<String>, predicate: F) -> Arc<dyn ToolFilter>
where
    F: Fn(&ToolDescriptor, &FilterContext<'_>) -> Result<bool, ResolveError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(FnToolFilter {
        name: name.into(),
        predicate,
    })
}

/// AND-composition of filters. An empty chain shows every tool.
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn ToolFilter>>,
}

impl FilterChain {
    pub fn new(filters: impl IntoIterator<Item = Arc<dyn ToolFilter>>) -> Self {
        Self {
            filters: filters.into_iter().collect(),
        }
    }

    pub fn push(&mut self, filter: Arc<dyn ToolFilter>) {
        self.filters.push(filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Evaluate every filter. Any resolution error wins over a `false` decision,
    /// so the outcome does not depend on filter order.
    pub fn is_visible(
        &self,
        tool: &ToolDescriptor,
        ctx: &FilterContext<'_>,
    ) -> Result<bool, ResolveError> {
        let mut visible = true;
        let mut first_error = None;
        for filter in &self.filters {
            match filter.is_visible(tool, ctx) {
                Ok(true) => {}
                Ok(false) => {
                    debug!(
                        target: "mcp_extensions::filters",
                        tool = %tool.name,
                        filter = filter.name(),
                        "Tool hidden by filter"
                    );
                    visible = false;
                }
                Err(err) => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(visible),
        }
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.filters.iter().map(|filter| filter.name()))
            .finish()
    }
}

/// Why a call was refused before dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallRejection {
    /// Hidden or unknown tool. Deliberately indistinguishable to the client.
    Unavailable { tool: String },
    /// Session configuration could not be resolved.
    Config(ResolveError),
}

impl CallRejection {
    pub fn to_error_data(&self) -> ErrorData {
        match self {
            CallRejection::Unavailable { tool } => tool_unavailable_error(tool),
            CallRejection::Config(err) => resolve_error_to_error_data(err),
        }
    }
}

/// Error returned for calls to hidden or unknown tools.
///
/// Names the tool but never the filter or configuration that hid it.
pub fn tool_unavailable_error(tool: &str) -> ErrorData {
    let message = format!(
        "Tool '{tool}' is not available. It may be restricted based on your current session configuration."
    );
    TOOL_UNAVAILABLE_ERROR
        .builder()
        .message(message.clone())
        .retryable(false)
        .with_context_field("tool", json!(tool))
        .build()
        .unwrap_or_else(|_| ErrorData::invalid_params(message, None))
}

/// The integration seam used by the server handler: shared config plus filters.
#[derive(Debug, Clone, Default)]
pub struct ToolVisibility {
    config: Arc<ConfigSet>,
    chain: FilterChain,
}

impl ToolVisibility {
    pub fn new(config: Arc<ConfigSet>, chain: FilterChain) -> Self {
        Self { config, chain }
    }

    pub fn config(&self) -> &Arc<ConfigSet> {
        &self.config
    }

    pub fn chain(&self) -> &FilterChain {
        &self.chain
    }

    pub fn is_visible(
        &self,
        tool: &ToolDescriptor,
        request: &RequestContext,
    ) -> Result<bool, ResolveError> {
        let ctx = FilterContext::new(&self.config, request);
        self.chain.is_visible(tool, &ctx)
    }

    /// Listing hook: keep visible tools in their original order.
    pub fn filter_listing<T>(
        &self,
        tools: impl IntoIterator<Item = T>,
        request: &RequestContext,
    ) -> Result<Vec<T>, ResolveError>
    where
        T: AsRef<ToolDescriptor>,
    {
        let mut visible = Vec::new();
        for tool in tools {
            if self.is_visible(tool.as_ref(), request)? {
                visible.push(tool);
            }
        }
        Ok(visible)
    }

    /// Call-authorization hook: `tool` is the registered descriptor for `name`,
    /// or `None` when no such tool exists.
    ///
    /// Unknown names still run through the chain as an untagged, hint-less
    /// descriptor, so a resolution failure is reported the same way whether or
    /// not the tool exists.
    pub fn authorize_call(
        &self,
        name: &str,
        tool: Option<&ToolDescriptor>,
        request: &RequestContext,
    ) -> Result<(), CallRejection> {
        let unknown;
        let descriptor = match tool {
            Some(tool) => tool,
            None => {
                unknown = ToolDescriptor::new(name);
                &unknown
            }
        };
        match self.is_visible(descriptor, request) {
            Ok(true) if tool.is_some() => Ok(()),
            Ok(_) => Err(CallRejection::Unavailable {
                tool: name.to_string(),
            }),
            Err(err) => Err(CallRejection::Config(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::resolver::{ConfigArg, EnvView};

    fn read_tool() -> ToolDescriptor {
        ToolDescriptor::new("read_tool").with_hints(ToolHints {
            read_only: Some(true),
            ..ToolHints::default()
        })
    }

    fn write_tool() -> ToolDescriptor {
        ToolDescriptor::new("write_tool")
    }

    fn readonly_visibility() -> ToolVisibility {
        let config = ConfigSet::new(standard_config_args(&FilterDefaults::default()))
            .expect("standard args");
        ToolVisibility::new(
            Arc::new(config),
            FilterChain::new(standard_filters(Vec::<String>::new())),
        )
    }

    fn request(vars: &[(&str, &str)]) -> RequestContext {
        RequestContext::new(EnvView::fixed(vars.iter().copied()))
    }

    #[test]
    fn empty_chain_allows_everything() {
        let visibility = ToolVisibility::default();
        let ctx = RequestContext::default();
        assert!(visibility.is_visible(&write_tool(), &ctx).expect("visible"));
    }

    #[test]
    fn readonly_scenario_lists_and_calls_consistently() {
        let visibility = readonly_visibility();
        let ctx = request(&[("MCP_READONLY_MODE", "1")]);
        let tools = vec![read_tool(), write_tool()];

        let listed = visibility
            .filter_listing(tools.clone(), &ctx)
            .expect("listing");
        assert_eq!(listed, vec![read_tool()]);

        let write = visibility
            .authorize_call("write_tool", Some(&tools[1]), &ctx)
            .expect_err("write_tool must be rejected");
        assert_eq!(
            write,
            CallRejection::Unavailable {
                tool: "write_tool".into()
            }
        );
        visibility
            .authorize_call("read_tool", Some(&tools[0]), &ctx)
            .expect("read_tool allowed");
    }

    #[test]
    fn listing_and_call_paths_agree_for_every_context() {
        let visibility = readonly_visibility();
        let tools = vec![
            read_tool(),
            write_tool(),
            ToolDescriptor::new("wipe")
                .with_module("admin")
                .with_hints(ToolHints {
                    read_only: Some(true),
                    destructive: Some(true),
                    ..ToolHints::default()
                }),
        ];
        let contexts = [
            request(&[]),
            request(&[("MCP_READONLY_MODE", "true")]),
            request(&[("MCP_NO_DESTRUCTIVE_TOOLS", "1")]),
            request(&[("MCP_EXCLUDE_MODULES", "admin")]),
            request(&[("MCP_EXCLUDE_TOOLS", "read_tool")]),
            request(&[]).with_header("x-mcp-readonly-mode", "1"),
        ];
        for ctx in &contexts {
            let listed = visibility
                .filter_listing(tools.iter(), ctx)
                .expect("listing");
            for tool in &tools {
                let allowed = visibility.authorize_call(&tool.name, Some(tool), ctx).is_ok();
                assert_eq!(
                    allowed,
                    listed.contains(&tool),
                    "list/call disagreement for {}",
                    tool.name
                );
            }
        }
    }

    #[test]
    fn filter_order_does_not_change_visibility() {
        let config = Arc::new(
            ConfigSet::new(standard_config_args(&FilterDefaults::default())).expect("args"),
        );
        let forward = ToolVisibility::new(
            Arc::clone(&config),
            FilterChain::new([
                Arc::new(ReadonlyModeFilter) as Arc<dyn ToolFilter>,
                Arc::new(NoDestructiveToolsFilter),
            ]),
        );
        let reverse = ToolVisibility::new(
            config,
            FilterChain::new([
                Arc::new(NoDestructiveToolsFilter) as Arc<dyn ToolFilter>,
                Arc::new(ReadonlyModeFilter),
            ]),
        );
        let tool = ToolDescriptor::new("dangerous_reader").with_hints(ToolHints {
            read_only: Some(true),
            destructive: Some(true),
            ..ToolHints::default()
        });

        let readonly_only = request(&[("MCP_READONLY_MODE", "1")]);
        assert!(forward.is_visible(&tool, &readonly_only).expect("forward"));
        assert!(reverse.is_visible(&tool, &readonly_only).expect("reverse"));

        let both = request(&[
            ("MCP_READONLY_MODE", "1"),
            ("MCP_NO_DESTRUCTIVE_TOOLS", "1"),
        ]);
        assert!(!forward.is_visible(&tool, &both).expect("forward"));
        assert!(!reverse.is_visible(&tool, &both).expect("reverse"));
    }

    #[test]
    fn unknown_tools_are_rejected_like_hidden_ones() {
        let visibility = readonly_visibility();
        let err = visibility
            .authorize_call("ghost", None, &request(&[]))
            .expect_err("unknown tool");
        assert_eq!(err, CallRejection::Unavailable { tool: "ghost".into() });
    }

    #[test]
    fn unavailable_error_does_not_reveal_the_cause() {
        let data = tool_unavailable_error("write_tool");
        assert!(data.message.contains("write_tool"));
        let rendered = serde_json::to_string(&data).expect("serialize");
        assert!(!rendered.to_lowercase().contains("readonly"), "{rendered}");
        assert!(rendered.contains("TOOL_UNAVAILABLE"));
    }

    #[test]
    fn resolution_errors_fail_the_request() {
        let config = Arc::new(
            ConfigSet::new([ConfigArg::new("tenant").header("X-Tenant")]).expect("args"),
        );
        let chain = FilterChain::new([filter_fn("tenant", |_, ctx| {
            ctx.resolve("tenant").map(|tenant| tenant == "acme")
        })]);
        let visibility = ToolVisibility::new(config, chain);

        let err = visibility
            .filter_listing([write_tool()], &request(&[]))
            .expect_err("missing tenant should fail");
        assert!(matches!(err, ResolveError::MissingRequired { .. }));

        let rejection = visibility
            .authorize_call("write_tool", Some(&write_tool()), &request(&[]))
            .expect_err("missing tenant should reject");
        assert!(matches!(rejection, CallRejection::Config(_)));
        let unknown = visibility
            .authorize_call("ghost", None, &request(&[]))
            .expect_err("missing tenant should reject unknown names too");
        assert_eq!(unknown, rejection);

        let acme = request(&[]).with_header("x-tenant", "acme");
        assert_eq!(
            visibility
                .filter_listing([write_tool()], &acme)
                .expect("listing"),
            vec![write_tool()]
        );
    }
}
