//! Navigation list, recency history and the public/private visibility scope.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::persistence::Persistence;

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavDirection {
    Previous,
    Next,
}

impl NavDirection {
    pub fn step(self) -> isize {
        match self {
            NavDirection::Previous => -1,
            NavDirection::Next => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorKind {
    Local,
    Remote,
}

/// Opaque image address: a local path or an http(s) URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn from_path(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> LocatorKind {
        let lower = self.0.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            LocatorKind::Remote
        } else {
            LocatorKind::Local
        }
    }

    pub fn to_path(&self) -> Option<PathBuf> {
        match self.kind() {
            LocatorKind::Local => Some(PathBuf::from(self.0.strip_prefix("file://").unwrap_or(&self.0))),
            LocatorKind::Remote => None,
        }
    }

    /// Last path segment, without query or fragment for URLs.
    pub fn label(&self) -> String {
        let mut s = self.0.as_str();
        if self.kind() == LocatorKind::Remote {
            if let Some(end) = s.find(['?', '#']) {
                s = &s[..end];
            }
        }
        let trimmed = s.trim_end_matches(['/', '\\']);
        let segment = trimmed
            .rsplit(['/', '\\'])
            .next()
            .filter(|seg| !seg.is_empty());
        match segment {
            Some(seg) => seg.to_string(),
            None => self.0.clone(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub locator: Locator,
    pub label: String,
}

impl PlaylistEntry {
    pub fn new(locator: Locator) -> Self {
        let label = locator.label();
        Self { locator, label }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Load(PlaylistEntry),
    NoImages,
}

#[derive(Debug, Clone, Default)]
pub struct Playlist {
    entries: Vec<PlaylistEntry>,
    cursor: Option<usize>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[PlaylistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn current(&self) -> Option<&PlaylistEntry> {
        self.cursor.and_then(|i| self.entries.get(i))
    }

    pub fn position(&self, locator: &Locator) -> Option<usize> {
        self.entries.iter().position(|e| &e.locator == locator)
    }

    /// Moves the cursor with wraparound.
    pub fn navigate(&mut self, direction: NavDirection) -> Navigation {
        let size = self.entries.len();
        if size == 0 {
            return Navigation::NoImages;
        }
        let next = match (self.cursor, direction) {
            (None, NavDirection::Next) => 0,
            (None, NavDirection::Previous) => size - 1,
            (Some(index), dir) => {
                let size = size as isize;
                ((index as isize + dir.step() + size) % size) as usize
            }
        };
        self.cursor = Some(next);
        Navigation::Load(self.entries[next].clone())
    }

    /// Points the cursor at `locator`, inserting it at the front if new.
    pub fn record_view(&mut self, locator: &Locator) -> usize {
        let index = match self.position(locator) {
            Some(index) => index,
            None => {
                self.entries.insert(0, PlaylistEntry::new(locator.clone()));
                0
            }
        };
        self.cursor = Some(index);
        index
    }

    /// Installs a fresh list, keeping the cursor on the current locator if it
    /// survived.
    pub fn replace_entries(&mut self, locators: Vec<Locator>) {
        let current = self.current().map(|e| e.locator.clone());
        self.entries = locators.into_iter().map(PlaylistEntry::new).collect();
        self.cursor = current.and_then(|locator| self.position(&locator));
    }
}

/// Bounded most-recent-first list without duplicates.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Locator>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn from_entries(entries: Vec<Locator>, limit: usize) -> Self {
        let mut history = Self::new(limit);
        // Oldest first so the newest ends up in front
        for locator in entries.into_iter().rev() {
            history.push(locator);
        }
        history
    }

    pub fn push(&mut self, locator: Locator) {
        self.entries.retain(|l| l != &locator);
        self.entries.insert(0, locator);
        self.entries.truncate(self.limit);
    }

    pub fn head(&self) -> Option<&Locator> {
        self.entries.first()
    }

    pub fn entries(&self) -> &[Locator] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisibilityMode {
    #[default]
    Public,
    Private,
}

impl VisibilityMode {
    pub fn toggled(self) -> Self {
        match self {
            VisibilityMode::Public => VisibilityMode::Private,
            VisibilityMode::Private => VisibilityMode::Public,
        }
    }
}

/// Playlist plus the two persisted histories.
#[derive(Debug)]
pub struct PlaylistManager {
    playlist: Playlist,
    public: History,
    private: History,
    mode: VisibilityMode,
    persistence: Persistence,
}

impl PlaylistManager {
    pub fn new(persistence: Persistence, history_limit: usize) -> Self {
        let mode = persistence.visibility_mode();
        let public = History::from_entries(persistence.history(VisibilityMode::Public), history_limit);
        let private = History::from_entries(persistence.history(VisibilityMode::Private), history_limit);
        Self {
            playlist: Playlist::new(),
            public,
            private,
            mode,
            persistence,
        }
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn visibility_mode(&self) -> VisibilityMode {
        self.mode
    }

    pub fn history(&self, mode: VisibilityMode) -> &History {
        match mode {
            VisibilityMode::Public => &self.public,
            VisibilityMode::Private => &self.private,
        }
    }

    fn history_mut(&mut self, mode: VisibilityMode) -> &mut History {
        match mode {
            VisibilityMode::Public => &mut self.public,
            VisibilityMode::Private => &mut self.private,
        }
    }

    pub fn navigate(&mut self, direction: NavDirection) -> Navigation {
        self.playlist.navigate(direction)
    }

    pub fn record_view(&mut self, locator: &Locator) -> usize {
        self.playlist.record_view(locator)
    }

    pub fn replace_entries(&mut self, locators: Vec<Locator>) {
        self.playlist.replace_entries(locators);
    }

    /// Adds to the active scope's history and persists it.
    pub fn add_to_history(&mut self, locator: &Locator) {
        let mode = self.mode;
        let history = self.history_mut(mode);
        history.push(locator.clone());
        let snapshot = history.entries().to_vec();
        self.persistence.save_history(mode, &snapshot);
    }

    /// What to show for the active scope: newest history entry, then the
    /// scope's last-URI key.
    pub fn restore_target(&self) -> Option<Locator> {
        self.history(self.mode)
            .head()
            .cloned()
            .or_else(|| self.persistence.last_uri(self.mode))
    }

    /// Flips public/private, persists it and returns what the new scope
    /// should show. `None` means an empty viewport.
    pub fn toggle_visibility_mode(&mut self) -> Option<Locator> {
        self.mode = self.mode.toggled();
        self.persistence.set_visibility_mode(self.mode);
        tracing::info!(mode = ?self.mode, "visibility mode changed");
        self.restore_target()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist_of(items: &[&str]) -> Playlist {
        let mut playlist = Playlist::new();
        playlist.replace_entries(items.iter().map(|s| Locator::new(*s)).collect());
        playlist
    }

    fn expect_load(nav: Navigation) -> String {
        match nav {
            Navigation::Load(entry) => entry.locator.to_string(),
            Navigation::NoImages => panic!("expected an entry"),
        }
    }

    #[test]
    fn test_empty_playlist_has_no_images() {
        let mut playlist = Playlist::new();
        assert_eq!(playlist.navigate(NavDirection::Next), Navigation::NoImages);
        assert_eq!(playlist.navigate(NavDirection::Previous), Navigation::NoImages);
        assert_eq!(playlist.cursor(), None);
    }

    #[test]
    fn test_navigation_wraps_around() {
        let mut playlist = playlist_of(&["/a.jpg", "/b.jpg", "/c.jpg"]);
        playlist.record_view(&Locator::new("/c.jpg"));
        assert_eq!(expect_load(playlist.navigate(NavDirection::Next)), "/a.jpg");
        assert_eq!(expect_load(playlist.navigate(NavDirection::Previous)), "/c.jpg");

        for _ in 0..7 {
            playlist.navigate(NavDirection::Next);
        }
        // 7 mod 3 == 1 step forward from c
        assert_eq!(playlist.cursor(), Some(0));
    }

    #[test]
    fn test_navigation_without_cursor() {
        let mut playlist = playlist_of(&["/a.jpg", "/b.jpg", "/c.jpg"]);
        assert_eq!(expect_load(playlist.navigate(NavDirection::Next)), "/a.jpg");

        let mut playlist = playlist_of(&["/a.jpg", "/b.jpg", "/c.jpg"]);
        assert_eq!(expect_load(playlist.navigate(NavDirection::Previous)), "/c.jpg");
    }

    #[test]
    fn test_record_view_does_not_reorder_known_entries() {
        let mut playlist = playlist_of(&["/a.jpg", "/b.jpg"]);
        assert_eq!(playlist.record_view(&Locator::new("/b.jpg")), 1);
        assert_eq!(playlist.len(), 2);

        assert_eq!(playlist.record_view(&Locator::new("https://x.org/new.png")), 0);
        assert_eq!(playlist.len(), 3);
        assert_eq!(playlist.entries()[1].locator.as_str(), "/a.jpg");
        assert_eq!(playlist.current().map(|e| e.label.as_str()), Some("new.png"));
    }

    #[test]
    fn test_replace_entries_keeps_current() {
        let mut playlist = playlist_of(&["/a.jpg", "/b.jpg"]);
        playlist.record_view(&Locator::new("/b.jpg"));
        playlist.replace_entries(vec![
            Locator::new("/0.jpg"),
            Locator::new("/a.jpg"),
            Locator::new("/b.jpg"),
        ]);
        assert_eq!(playlist.cursor(), Some(2));

        playlist.replace_entries(vec![Locator::new("/z.jpg")]);
        assert_eq!(playlist.cursor(), None);
    }

    #[test]
    fn test_history_bound_and_dedup() {
        let mut history = History::new(DEFAULT_HISTORY_LIMIT);
        for i in 0..15 {
            history.push(Locator::new(format!("/img{}.jpg", i)));
        }
        history.push(Locator::new("/img10.jpg"));
        assert_eq!(history.len(), 10);
        assert_eq!(history.head().map(|l| l.as_str()), Some("/img10.jpg"));
        let mut seen = std::collections::HashSet::new();
        assert!(history.entries().iter().all(|l| seen.insert(l.clone())));
        // The oldest surviving entry is img5
        assert_eq!(history.entries().last().map(|l| l.as_str()), Some("/img5.jpg"));
    }

    #[test]
    fn test_history_from_entries_keeps_order() {
        let stored = vec![Locator::new("/c"), Locator::new("/b"), Locator::new("/c"), Locator::new("/a")];
        let history = History::from_entries(stored, 10);
        let order: Vec<_> = history.entries().iter().map(|l| l.as_str()).collect();
        assert_eq!(order, vec!["/c", "/b", "/a"]);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Locator::new("/sdcard/DCIM/cat.jpg").label(), "cat.jpg");
        assert_eq!(Locator::new("https://host/p/dog.png?size=big#top").label(), "dog.png");
        assert_eq!(Locator::new("https://host/dir/").label(), "dir");
        assert_eq!(Locator::new("C:\\pics\\bird.webp").label(), "bird.webp");
        assert_eq!(Locator::new("/").label(), "/");
    }

    #[test]
    fn test_locator_kind() {
        assert_eq!(Locator::new("HTTPS://a/b.jpg").kind(), LocatorKind::Remote);
        assert_eq!(Locator::new("/a/b.jpg").kind(), LocatorKind::Local);
        assert_eq!(Locator::new("file:///a/b.jpg").to_path(), Some(PathBuf::from("/a/b.jpg")));
        assert_eq!(Locator::new("http://a/b.jpg").to_path(), None);
    }

    #[test]
    fn test_history_persisted_per_scope() {
        let persistence = Persistence::in_memory();
        let mut manager = PlaylistManager::new(persistence.clone(), 10);
        manager.add_to_history(&Locator::new("/public.jpg"));

        assert_eq!(manager.toggle_visibility_mode(), None);
        assert_eq!(persistence.visibility_mode(), VisibilityMode::Private);
        manager.add_to_history(&Locator::new("/private.jpg"));

        assert_eq!(manager.toggle_visibility_mode(), Some(Locator::new("/public.jpg")));
        assert_eq!(persistence.history(VisibilityMode::Private), vec![Locator::new("/private.jpg")]);

        let reloaded = PlaylistManager::new(persistence, 10);
        assert_eq!(reloaded.visibility_mode(), VisibilityMode::Public);
        assert_eq!(reloaded.history(VisibilityMode::Public).len(), 1);
    }

    #[test]
    fn test_toggle_falls_back_to_last_uri() {
        let persistence = Persistence::in_memory();
        persistence.set_last_uri(VisibilityMode::Private, &Locator::new("/hidden.png"));
        let mut manager = PlaylistManager::new(persistence, 10);
        assert_eq!(manager.toggle_visibility_mode(), Some(Locator::new("/hidden.png")));
    }
}
