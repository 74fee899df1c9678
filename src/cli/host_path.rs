use std::path::PathBuf;

pub const HOST_BINARY: &str = "sitetime-host";

/// The host is installed next to the cli executable.
pub fn to_host_path(mut path: PathBuf) -> PathBuf {
    path.set_file_name(HOST_BINARY);
    #[cfg(windows)]
    {
        path.set_extension("exe");
    }
    path
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::to_host_path;

    #[cfg(unix)]
    #[test]
    fn test_host_is_a_sibling() {
        assert_eq!(
            to_host_path(PathBuf::from("/usr/local/bin/sitetime")),
            PathBuf::from("/usr/local/bin/sitetime-host")
        );
    }
}
