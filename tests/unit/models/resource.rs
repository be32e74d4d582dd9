use super::*;

#[test]
fn test_parse_keeps_uris() {
    let uri = ResourceUri::parse("file:///tmp/cat.paw");
    assert_eq!(uri.scheme(), "file");
    assert_eq!(uri.to_file_path(), Some(PathBuf::from("/tmp/cat.paw")));

    let untitled = ResourceUri::parse("untitled:Untitled-1");
    assert!(untitled.is_untitled());
    assert_eq!(untitled.to_file_path(), None);
}

#[test]
fn test_bare_path_becomes_file_uri() {
    let uri = ResourceUri::parse("/tmp/dog.paw");
    assert_eq!(uri.as_str(), "file:///tmp/dog.paw");
    assert_eq!(uri, ResourceUri::from_path(Path::new("/tmp/dog.paw")));
}

#[test]
fn test_relative_path_is_made_absolute() {
    let uri = ResourceUri::from_path(Path::new("drawing.paw"));
    let path = uri.to_file_path().unwrap();
    assert!(path.is_absolute());
    assert!(path.ends_with("drawing.paw"));
}

#[test]
fn test_untitled_constructor() {
    let uri = ResourceUri::untitled("Untitled-2");
    assert_eq!(uri.as_str(), "untitled:Untitled-2");
    assert_eq!(uri.to_string(), "untitled:Untitled-2");
}

#[test]
fn test_serde_is_plain_string() {
    let uri = ResourceUri::parse("file:///a/b.paw");
    let json = serde_json::to_string(&uri).unwrap();
    assert_eq!(json, "\"file:///a/b.paw\"");
    let back: ResourceUri = serde_json::from_str(&json).unwrap();
    assert_eq!(back, uri);
}
