use crate::commands::Out;
use rmcp::model::{CallToolResult, Content};
use rmcp::ErrorData;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{error, warn};

/// Converts command output into tool content: the message as text, followed by the structured
/// data as JSON when there is any.
fn to_content<T>(out: Out<T>) -> Vec<Content>
where
    T: Debug + Clone + Serialize,
{
    let mut content = vec![Content::text(out.message())];
    if let Some(object) = out.structure() {
        match Content::json(object) {
            Ok(json) => content.push(json),
            Err(e) => error!("Unable to serialize JSON output: {e}"),
        };
    }
    content
}

/// Command failures are reported as tool errors, not protocol errors, so the agent can read the
/// message and try again.
pub(super) fn tool_result<T>(result: crate::Result<Out<T>>) -> Result<CallToolResult, ErrorData>
where
    T: Debug + Clone + Serialize,
{
    Ok(match result {
        Ok(out) => CallToolResult::success(to_content(out)),
        Err(e) => {
            warn!("Tool call failed ({:?}): {e}", e.error_type());
            CallToolResult::error(vec![Content::text(e.to_string())])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_tool_result_success() {
        let out = Out::new("Found 1 thing", vec![1, 2, 3]);
        let result = tool_result(Ok(out)).unwrap();
        assert!(!result.is_error.unwrap_or(false));
        assert_eq!(result.content.len(), 2);
    }

    #[test]
    fn test_tool_result_message_only() {
        let out: Out<()> = "Done".into();
        let result = tool_result(Ok(out)).unwrap();
        assert_eq!(result.content.len(), 1);
    }

    #[test]
    fn test_tool_result_error() {
        let result = tool_result::<()>(Err(Error::not_found("tx-1"))).unwrap();
        assert!(result.is_error.unwrap_or(false));
        assert_eq!(result.content.len(), 1);
    }
}
