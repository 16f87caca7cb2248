use crate::events::Timeline;
use std::fs;
use std::path::Path;

/// Write a merged timeline as pretty JSON.
pub fn save_timeline_json<P: AsRef<Path>>(timeline: &Timeline, path: P) -> anyhow::Result<()> {
    let data = timeline.to_json_pretty()?;
    fs::write(path, data)?;
    Ok(())
}

pub fn load_timeline_json<P: AsRef<Path>>(path: P) -> anyhow::Result<Timeline> {
    let data = fs::read_to_string(path)?;
    let timeline = Timeline::from_json(&data)?;
    Ok(timeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventAggregator;
    use tempfile::TempDir;

    #[test]
    fn test_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("timeline.json");

        let mut aggregator = EventAggregator::new();
        aggregator.add_event(4, "RightOfNet");
        aggregator.add_event(5, "Bounce");
        aggregator.add_event(6, "Bounce");
        let timeline = aggregator.merge();

        save_timeline_json(&timeline, &path).unwrap();
        assert!(path.exists());

        let loaded = load_timeline_json(&path).unwrap();
        assert_eq!(loaded, timeline);
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_load_rejects_non_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"frameIndex": 1, "event": "Shot"}"#).unwrap();
        assert!(load_timeline_json(&path).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(load_timeline_json(dir.path().join("nope.json")).is_err());
    }
}
