use std::fmt::Write as _;

use serde::Serialize;

use crate::cli::VersionArgs;
use crate::client::CliResult;
use crate::output::print_json;

/// Build metadata embedded at compile time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VersionInfo {
    pub(crate) version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) commit: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) build_date: Option<&'static str>,
}

impl VersionInfo {
    pub(crate) fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            commit: option_env!("ENSYNC_GIT_SHA").filter(|value| !value.is_empty()),
            build_date: option_env!("ENSYNC_BUILD_DATE").filter(|value| !value.is_empty()),
        }
    }

    fn text(&self) -> String {
        let mut out = format!("ensync {}\n", self.version);
        if let Some(commit) = self.commit {
            let _ = writeln!(out, "  commit: {commit}");
        }
        if let Some(built) = self.build_date {
            let _ = writeln!(out, "  built:  {built}");
        }
        out
    }
}

pub(crate) fn handle_version(args: &VersionArgs) -> CliResult<()> {
    let info = VersionInfo::current();
    if args.json {
        print_json(&info)
    } else {
        print!("{}", info.text());
        Ok(())
    }
}
