//! Extention traits for base types defined in `cmb-core`.
use std::path::{Component, Path, PathBuf};

use cmb_core::{Entry, PathField};

use crate::Error;

pub trait EntryExt {
    fn check_path(&self) -> Result<PathBuf, Error>;
}

impl EntryExt for Entry {
    fn check_path(&self) -> Result<PathBuf, Error> {
        self.path_field().check_path()
    }
}

impl EntryExt for PathField {
    /// Split the stored path on backslashes into a relative host path,
    /// ensuring that every component is a normal file name.
    fn check_path(&self) -> Result<PathBuf, Error> {
        let stored = self.decode()?;
        let mut path = PathBuf::new();
        for component in self.components()? {
            let mut parsed = Path::new(component).components();
            match (parsed.next(), parsed.next()) {
                (Some(Component::Normal(name)), None) if name == component => path.push(name),
                _ => {
                    return Err(Error::InvalidPath {
                        entry: stored.to_string(),
                        component: component.to_string(),
                    });
                }
            }
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use cmb_core::PathField;

    use super::EntryExt;
    use crate::Error;

    fn check(path: &str) -> Result<PathBuf, Error> {
        PathField::encode(path).unwrap().check_path()
    }

    #[test]
    fn nested_path_is_split() {
        let expected: PathBuf = ["root", "sub", "b.txd"].iter().collect();
        assert_eq!(check("root\\sub\\b.txd").unwrap(), expected);
    }

    #[test]
    fn non_normal_components_are_rejected() {
        for path in ["", "root\\..\\evil.txd", "root\\.\\a.txd", "root\\\\a.txd", "/abs\\a.txd", "root\\a/b.txd"] {
            match check(path) {
                Err(Error::InvalidPath { entry, .. }) => assert_eq!(entry, path),
                other => panic!("{:?} was accepted: {:?}", path, other),
            }
        }
    }
}
