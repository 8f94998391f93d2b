pub mod case_intake;
pub mod case_lookup;
pub mod document_search;
pub mod manager;
pub mod web_search;

pub use manager::ToolManager;

use serde_json::Value;

/// Trait that all agent capabilities implement.
///
/// The name and description are part of the contract: the model selects a
/// capability from them, so they must state scope and required inputs
/// accurately.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Name of the tool (must match regex `^[a-zA-Z0-9_-]{1,64}$`)
    fn name(&self) -> &str;

    /// Description of what the tool does
    fn description(&self) -> &str;

    /// JSON Schema for the tool's input
    fn input_schema(&self) -> Value;

    /// Execute the tool with the given arguments
    async fn execute(&self, args: Value) -> Result<String, String>;
}
