//! Resources compiled into the binary.
//!
//! Packaged resources are addressed as `resource:///<name>`, which keeps them
//! hierarchical: relative references inside a packaged schema resolve against
//! its parent the same way they would on disk.

use url::Url;

pub const PACKAGED_SCHEME: &str = "resource";

static PACKAGED: &[(&str, &str)] = &[
    (
        "xsd/sbe.xsd",
        include_str!("../../../resources/xsd/sbe.xsd"),
    ),
    (
        "xsd/sbe-2.0rc3.xsd",
        include_str!("../../../resources/xsd/sbe-2.0rc3.xsd"),
    ),
];

pub fn packaged_names() -> impl Iterator<Item = &'static str> {
    PACKAGED.iter().map(|(name, _)| *name)
}

pub(crate) fn packaged(name: &str) -> Option<&'static str> {
    let name = name.trim_start_matches('/');
    PACKAGED
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, contents)| *contents)
}

pub(crate) fn packaged_url(name: &str) -> Option<Url> {
    packaged(name)?;
    Url::parse(&format!(
        "{PACKAGED_SCHEME}:///{}",
        name.trim_start_matches('/')
    ))
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packaged_schemas_are_addressable() {
        for name in packaged_names() {
            let url = packaged_url(name).expect("packaged url");
            assert_eq!(url.scheme(), PACKAGED_SCHEME);
            assert_eq!(url.path(), format!("/{name}"));
            assert!(packaged(url.path()).is_some());
        }
        assert!(packaged_url("xsd/missing.xsd").is_none());
    }
}
