//! Logging setup utilities shared by the relay and client binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose log output is enabled at the default level.
const WORKSPACE_CRATES: [&str; 3] = ["huddle_shared", "huddle_client", "huddle_relay"];

/// Build the default filter directive for the workspace crates and the binary.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "huddle-relay", "huddle-client")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
pub fn default_directive(binary_name: &str, default_log_level: &str) -> String {
    let mut directives: Vec<String> = WORKSPACE_CRATES
        .iter()
        .map(|name| format!("{}={}", name, default_log_level))
        .collect();

    let binary_target = binary_name.replace('-', "_");
    if !WORKSPACE_CRATES.contains(&binary_target.as_str()) {
        directives.push(format!("{}={}", binary_target, default_log_level));
    }

    directives.join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Examples
///
/// ```no_run
/// use huddle_shared::logger::setup_logger;
///
/// setup_logger("huddle-relay", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_covers_workspace_crates() {
        // テスト項目: ワークスペースの全クレートにデフォルトレベルが設定される
        // given (前提条件):
        let binary_name = "huddle-relay";

        // when (操作):
        let directive = default_directive(binary_name, "debug");

        // then (期待する結果):
        assert_eq!(
            directive,
            "huddle_shared=debug,huddle_client=debug,huddle_relay=debug"
        );
    }

    #[test]
    fn test_default_directive_appends_foreign_binary() {
        // テスト項目: ワークスペース外のバイナリ名はディレクティブに追加される
        // given (前提条件):
        let binary_name = "load-tester";

        // when (操作):
        let directive = default_directive(binary_name, "info");

        // then (期待する結果):
        assert!(directive.ends_with(",load_tester=info"));
    }
}
