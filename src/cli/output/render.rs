use std::fmt::Display;

use crate::utils::time::format_duration;

use super::SiteUsage;

pub const LOADING_MESSAGE: &str = "Loading...";
pub const NO_DATA_MESSAGE: &str = "No data recorded for this period.";
pub const ERROR_MESSAGE: &str = "Error loading data.";

/// Every state the statistics report can be in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsView {
    Loading,
    Failed,
    Usages(Vec<SiteUsage>),
}

impl From<Vec<SiteUsage>> for StatsView {
    fn from(value: Vec<SiteUsage>) -> Self {
        StatsView::Usages(value)
    }
}

impl Display for StatsView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsView::Loading => writeln!(f, "{LOADING_MESSAGE}"),
            StatsView::Failed => writeln!(f, "{ERROR_MESSAGE}"),
            StatsView::Usages(usages) if usages.is_empty() => writeln!(f, "{NO_DATA_MESSAGE}"),
            StatsView::Usages(usages) => {
                for usage in usages {
                    writeln!(
                        f,
                        "{}: {}",
                        usage.hostname,
                        format_duration(usage.duration())
                    )?;
                }
                Ok(())
            }
        }
    }
}
