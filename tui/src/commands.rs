//! Non-interactive commands: print a finished diff or one node's properties.

use std::sync::Arc;

use anyhow::Context;
use anyhow::bail;
use snitch_diff_client::DiffApi;
use snitch_diff_client::DiffTarget;
use snitch_diff_core::DetailInspector;
use snitch_diff_core::DiffConfig;
use snitch_diff_core::DiffSession;
use snitch_diff_core::SessionOptions;
use snitch_diff_core::SessionState;
use snitch_diff_core::Size;
use snitch_diff_core::TextBackend;
use snitch_diff_core::TreeRenderer;

/// Outcome of [`dump`]. `error` is set when the diff failed after its
/// structure arrived; `text` then holds whatever had loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpReport {
    pub text: String,
    pub error: Option<String>,
}

fn render_tree(session: &DiffSession, config: &DiffConfig) -> Option<String> {
    let skeleton = session.skeleton()?;
    let mut renderer = TreeRenderer::new(
        skeleton,
        config.labels.clone(),
        config.layout,
        Size::UNBOUNDED,
    );
    renderer.refresh_labels(session.index());
    let index = session.index();
    Some(format!(
        "{}\n\n{} · {}/{}",
        TextBackend::render(&renderer, None),
        session.state(),
        index.loaded(),
        index.len()
    ))
}

/// Poll `target` to completion and render the whole tree as text, followed
/// by a status line.
pub async fn dump(
    api: Arc<dyn DiffApi>,
    target: DiffTarget,
    config: &DiffConfig,
) -> anyhow::Result<DumpReport> {
    let mut session = DiffSession::start(api, target, SessionOptions::from(config));
    let state = session.run_until_terminal().await;
    match state {
        SessionState::Done => {
            let text = render_tree(&session, config).context("finished diff has no structure")?;
            Ok(DumpReport { text, error: None })
        }
        SessionState::Empty => Ok(DumpReport {
            text: state.to_string(),
            error: None,
        }),
        SessionState::Error => {
            let error = session.last_error().unwrap_or("unknown error").to_string();
            match render_tree(&session, config) {
                Some(tree) => Ok(DumpReport {
                    text: format!("{tree}\n{error}"),
                    error: Some(error),
                }),
                None => bail!("{state} {}: {error}", session.target()),
            }
        }
        SessionState::LoadingStructure | SessionState::LoadingNodes => {
            bail!("diff session for {} stopped before finishing", session.target())
        }
    }
}

/// Property table of one node in `target`.
pub async fn node(
    api: &dyn DiffApi,
    target: &DiffTarget,
    node_model: &str,
    node_id: &str,
) -> anyhow::Result<String> {
    let record = api
        .node(target, node_model, node_id)
        .await
        .with_context(|| format!("fetching {node_model} {node_id} from {target}"))?;
    match record {
        Some(record) => Ok(DetailInspector::new(node_model, node_id, &record).to_text()),
        None => Ok(format!(
            "{node_model} {node_id} is not part of this diff (or the diff is still computing)"
        )),
    }
}
