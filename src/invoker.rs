#![forbid(unsafe_code)]

use crate::engine::{BROWSER_USER_AGENT, EngineRequest, Extractor};
use crate::error::EngineError;
use crate::media_info::MediaInfo;
use crate::naming::FilenameStyle;
use crate::profile::DownloadPlan;
use anyhow::{Result, anyhow};
use std::path::Path;
use tracing::{debug, info, warn};

pub const NO_EXPLICIT_ERROR: &str = "Download failed with no explicit error";

/// Runs the plan's profiles in order until one succeeds.
///
/// Only the engine's own download failures move on to the next profile; the
/// last one is returned unchanged once the chain is exhausted. A launch
/// failure aborts immediately because no other profile would fare better.
pub fn download_with_fallback<E: Extractor + ?Sized>(
    extractor: &E,
    url: &str,
    plan: &DownloadPlan,
    output_dir: &Path,
    style: FilenameStyle,
    verbose: bool,
) -> Result<MediaInfo> {
    let output_template = style.output_template(output_dir);
    let mut last_error = None;

    for (index, profile) in plan.profiles.iter().enumerate() {
        let request = EngineRequest {
            format: profile.format.clone(),
            player_client: profile.player_client,
            output_template: output_template.clone(),
            allow_playlist: plan.allow_playlist,
            merge_output_format: plan.merge_output_format,
            post_process: plan.post_process,
            user_agent: BROWSER_USER_AGENT,
            restrict_filenames: true,
            verbose,
        };
        debug!(
            %url,
            profile = profile.label,
            attempt = index + 1,
            of = plan.profiles.len(),
            "trying download profile"
        );

        match extractor.extract(url, &request) {
            Ok(info) => {
                info!(%url, profile = profile.label, "download finished");
                return Ok(info);
            }
            Err(EngineError::Download(err)) => {
                warn!(%url, profile = profile.label, error = %err, "download profile failed");
                last_error = Some(err);
            }
            Err(other) => return Err(other.into()),
        }
    }

    match last_error {
        Some(err) => Err(err.into()),
        None => Err(anyhow!(NO_EXPLICIT_ERROR)),
    }
}
