use crate::Cli;
use crate::util::strip_ansi;
use clap::Parser;
use gleaner_core::{ExtractSettings, Profile};
use gleaner_provider_document::DocumentTree;
use gleaner_runtime::Extractor;
use rstest::fixture;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const FEED_XML: &str = r#"<html>
  <body>
    <ul class="feed">
      <li data-id="m3">
        <div><a href="/u/ada">Ada</a></div>
        <time datetime="2024-05-03T10:00">May 3</time>
        <p>Notes on the engine</p>
        <span>12 likes</span>
      </li>
      <li data-id="m2">
        <div><a href="/u/grace">Grace</a></div>
        <time datetime="2024-05-02T09:30">May 2</time>
        <p>Found a moth &amp; taped it in</p>
        <span>1 like</span>
      </li>
      <li data-id="m1">
        <div><a href="/u/alan">Alan</a></div>
        <time datetime="2024-05-01T08:15">May 1</time>
        <p>Can machines think?</p>
        <span>40 likes</span>
      </li>
    </ul>
  </body>
</html>
"#;

pub const PROFILE_JSON: &str = r#"{
  "settings": { "ready_timeout_ms": 100, "field_timeout_ms": 50, "probe_timeout_ms": 10,
                "poll_interval_ms": 5, "lookahead": 3 },
  "types": [
    { "name": "Message", "root": "/html/body/ul/li[{index}]",
      "fields": [
        { "name": "sender", "fragment": "/div", "kind": { "nested": { "record": "Person" } } },
        { "name": "timestamp", "fragment": "/time", "kind": { "scalar": { "attribute": "datetime" } } },
        { "name": "information", "fragment": "/p" },
        { "name": "likes", "fragment": "/span", "kind": { "scalar": { "shape": "count" } } },
        { "name": "element", "kind": "handle" } ] },
    { "name": "Person", "root": "/html/body/ul/li[1]/div",
      "fields": [
        { "name": "name", "fragment": "/a" },
        { "name": "profile", "fragment": "/a", "kind": { "scalar": { "attribute": "href" } } } ] }
  ]
}"#;

/// Extractor over [`FEED_XML`] with the [`PROFILE_JSON`] types and instant sleeps.
pub fn feed_extractor() -> Extractor {
    let profile = Profile::from_json_str(PROFILE_JSON).expect("profile");
    let settings = ExtractSettings::default().with_overrides(&profile.settings.to_overrides());
    let tree = Arc::new(DocumentTree::from_xml(FEED_XML).expect("document"));
    let mut extractor = Extractor::new(tree, settings).with_sleep(|_| {});
    for record_type in profile.types {
        extractor.register(record_type);
    }
    extractor
}

pub fn plain(output: &str) -> String {
    strip_ansi(output).into_owned()
}

/// Document and profile written to a temporary directory.
pub struct Workspace {
    _dir: TempDir,
    pub document: PathBuf,
    pub profile: PathBuf,
}

impl Workspace {
    /// Parses `args` with `--document` and `--profile` pointing at this workspace.
    pub fn parse(&self, args: &[&str]) -> Cli {
        let mut argv = vec![
            "gleaner".to_owned(),
            "--document".to_owned(),
            self.document.display().to_string(),
            "--profile".to_owned(),
            self.profile.display().to_string(),
        ];
        argv.extend(args.iter().map(|arg| (*arg).to_owned()));
        Cli::try_parse_from(argv).expect("arguments")
    }

    pub fn write_document(&self, xml: &str) {
        std::fs::write(&self.document, xml).expect("write document");
    }
}

/// rstest fixture: temporary directory holding feed.xml and profile.json
#[fixture]
pub fn workspace() -> Workspace {
    let dir = tempfile::tempdir().expect("tempdir");
    let document = dir.path().join("feed.xml");
    let profile = dir.path().join("profile.json");
    std::fs::write(&document, FEED_XML).expect("write document");
    std::fs::write(&profile, PROFILE_JSON).expect("write profile");
    Workspace { _dir: dir, document, profile }
}
