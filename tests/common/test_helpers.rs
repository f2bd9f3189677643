use std::path::{Path, PathBuf};

use tempfile::TempDir;

use validate_feed::ContainerSpec;

/// Two movie reviews; the second has an empty director name three levels down
pub const MOVIE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<reviews xmlns:media="http://search.yahoo.com/mrss/">
  <review>
    <id>movie-101</id>
    <title>Up</title>
    <media:rating scheme="urn:mpaa">PG</media:rating>
    <credits>
      <director>
        <name>Pete Docter</name>
      </director>
    </credits>
  </review>
  <review>
    <id>movie-102</id>
    <title>Cars</title>
    <media:rating scheme="urn:mpaa">G</media:rating>
    <credits>
      <director>
        <name></name>
      </director>
    </credits>
  </review>
</reviews>"#;

/// Expectations for [`MOVIE_FEED`], in the legacy key layout
pub const MOVIE_SPEC: &str = r#"{
  "container": "review",
  "elements": [
    { "element_id": "1", "element_name": "title", "element_value": "*" },
    {
      "element_id": "2",
      "element_name": "media:rating",
      "element_value": "G, PG, PG-13, R",
      "attributes": [
        { "attribute_id": "1", "attribute_name": "scheme", "attribute_value": "urn:mpaa" }
      ]
    },
    {
      "element_id": "3",
      "element_name": "credits",
      "child_elements": [
        {
          "element_id": "3.1",
          "element_name": "director",
          "child_elements": [
            { "element_id": "3.1.1", "element_name": "name", "element_value": "*" }
          ]
        }
      ]
    }
  ]
}"#;

/// Well-formed, but has no `review` containers
pub const GAME_FEED: &str = r#"<reviews><item><id>game-1</id></item></reviews>"#;

/// Not well-formed
pub const BROKEN_FEED: &str = r#"<reviews><review><id>1</id></reviews>"#;

pub fn movie_spec() -> ContainerSpec {
    ContainerSpec::from_json_str(MOVIE_SPEC).unwrap()
}

/// Scratch directories for reports and logs
pub struct TestEnv {
    pub temp_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn report_dir(&self) -> PathBuf {
        self.root().join("reports")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root().join("log")
    }

    /// Write `content` under the scratch root and return its path
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Contents of every file in `dir`, sorted by file name
    pub fn read_dir(dir: &Path) -> Vec<(String, String)> {
        let mut files: Vec<(String, String)> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| {
                let path = entry.unwrap().path();
                let name = path.file_name().unwrap().to_string_lossy().to_string();
                (name, std::fs::read_to_string(&path).unwrap())
            })
            .collect();
        files.sort();
        files
    }
}

/// Drop lines carrying wall-clock times so two runs can be compared
pub fn without_timestamps(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| {
            !(line.starts_with("Test started at")
                || line.starts_with("Test finished at")
                || line.starts_with("Duration:"))
        })
        .map(str::to_string)
        .collect()
}
