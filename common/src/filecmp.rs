use std::os::unix::fs::MetadataExt;
use tracing::instrument;

/// Attributes considered when deciding whether two files are the same.
///
/// The default compares size and modification time, content is never inspected.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MetadataCmpSettings {
    pub size: bool,
    pub mtime: bool,
}

impl Default for MetadataCmpSettings {
    fn default() -> Self {
        Self {
            size: true,
            mtime: true,
        }
    }
}

#[instrument]
pub fn metadata_equal(
    settings: &MetadataCmpSettings,
    metadata1: &std::fs::Metadata,
    metadata2: &std::fs::Metadata,
) -> bool {
    if settings.size && metadata1.size() != metadata2.size() {
        return false;
    }
    if settings.mtime
        && (metadata1.mtime() != metadata2.mtime()
            || metadata1.mtime_nsec() != metadata2.mtime_nsec())
    {
        return false;
    }
    true
}

/// Parses a comma separated attribute list, e.g. "size,mtime".
pub fn parse_compare_settings(settings: &str) -> anyhow::Result<MetadataCmpSettings> {
    let mut cmp_settings = MetadataCmpSettings {
        size: false,
        mtime: false,
    };
    for attribute in settings.split(',').map(str::trim) {
        match attribute {
            "size" => cmp_settings.size = true,
            "mtime" => cmp_settings.mtime = true,
            "" => {}
            _ => {
                return Err(anyhow::anyhow!(
                    "unknown compare attribute: {:?}, expected one of: size, mtime",
                    attribute
                ));
            }
        }
    }
    if !cmp_settings.size && !cmp_settings.mtime {
        // with nothing to compare every existing file would count as unchanged
        return Err(anyhow::anyhow!(
            "at least one compare attribute is required, expected: size, mtime"
        ));
    }
    Ok(cmp_settings)
}
