//! Title ordering: favorites first, then the active secondary key.

use std::cmp::Ordering;

use crate::config::Settings;
use crate::Title;

/// Secondary sort key. `Alpha` is the default and the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Alpha,
    LastPlayed,
    PlayTime,
}

impl SortMode {
    pub fn next(self) -> Self {
        match self {
            SortMode::Alpha => SortMode::LastPlayed,
            SortMode::LastPlayed => SortMode::PlayTime,
            SortMode::PlayTime => SortMode::Alpha,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortMode::Alpha => "name",
            SortMode::LastPlayed => "last played",
            SortMode::PlayTime => "play time",
        }
    }
}

/// Stable sort of one user's title vector. When exactly one of two titles
/// is a favorite, the favorite sorts first regardless of the secondary key.
pub fn sort_titles(titles: &mut [Title], mode: SortMode, settings: &Settings) {
    titles.sort_by(|l, r| {
        let lf = settings.favorite(l.id);
        let rf = settings.favorite(r.id);
        if lf != rf {
            return if lf { Ordering::Less } else { Ordering::Greater };
        }
        match mode {
            SortMode::LastPlayed => r.last_played_timestamp.cmp(&l.last_played_timestamp),
            SortMode::PlayTime => r.play_time_minutes.cmp(&l.play_time_minutes),
            SortMode::Alpha => l.name.cmp(&r.name),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn title(id: u64, name: &str, played: u32, minutes: u32) -> Title {
        let mut t = Title::new(
            id,
            1,
            String::new(),
            name.to_string(),
            String::new(),
            Path::new("/archive"),
        );
        t.last_played_timestamp = played;
        t.play_time_minutes = minutes;
        t
    }

    fn settings_with_favorite(tmp: &TempDir, id: u64) -> Settings {
        let mut s = Settings::load(tmp.path().join("config.json"));
        s.set_favorite(id, true);
        s
    }

    #[test]
    fn test_favorite_sorts_first_in_every_mode() {
        let tmp = TempDir::new().unwrap();
        let settings = settings_with_favorite(&tmp, 3);

        for mode in [SortMode::Alpha, SortMode::LastPlayed, SortMode::PlayTime] {
            let mut v = vec![
                title(1, "Aardvark", 900, 900),
                title(2, "Badger", 500, 500),
                title(3, "Zebra", 1, 1),
            ];
            sort_titles(&mut v, mode, &settings);
            assert_eq!(v[0].id, 3, "favorite must lead under {:?}", mode);
        }
    }

    #[test]
    fn test_secondary_modes() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path().join("config.json"));

        let mut v = vec![
            title(1, "Charlie", 10, 300),
            title(2, "Alpha", 30, 100),
            title(3, "Bravo", 20, 200),
        ];

        sort_titles(&mut v, SortMode::Alpha, &settings);
        assert_eq!(v.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2, 3, 1]);

        sort_titles(&mut v, SortMode::LastPlayed, &settings);
        assert_eq!(v.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2, 3, 1]);

        sort_titles(&mut v, SortMode::PlayTime, &settings);
        assert_eq!(v.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 3, 2]);
    }

    #[test]
    fn test_rotate_cycles_back_to_start() {
        let mut mode = SortMode::default();
        let start = mode;
        mode = mode.next();
        assert_ne!(mode, start);
        mode = mode.next().next();
        assert_eq!(mode, start);
    }
}
