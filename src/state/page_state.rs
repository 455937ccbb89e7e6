/// Listing page state definitions
///
/// A page moves strictly forward: it is pending until the fetcher has listed
/// its posts, then stays listed while each post is skipped or processed, and
/// is done once every retained post has been handled.
use std::fmt;

/// Represents the current state of a listing page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    /// Page has not been fetched yet
    Pending,

    /// Post identifiers have been listed (possibly none)
    PostsListed,

    /// Every retained post has been skipped or processed
    Done,
}

impl PageState {
    /// Returns the state that follows this one, or None from `Done`
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::PostsListed),
            Self::PostsListed => Some(Self::Done),
            Self::Done => None,
        }
    }

    /// Returns true if moving to `to` is a legal transition
    pub fn can_transition_to(&self, to: PageState) -> bool {
        self.next() == Some(to)
    }

    /// Returns true if no further work remains for the page
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Short lowercase name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PostsListed => "posts_listed",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
