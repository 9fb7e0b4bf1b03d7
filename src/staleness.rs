//! Revision-marker comparison. No content-level reconciliation: the single
//! local writer means marker equality is the whole question.

use crate::model::Revision;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Staleness {
    /// Markers match; nothing to do.
    Unchanged,
    /// Remote moved ahead of the local snapshot; refetch that record.
    RemoteAhead,
    /// A pending local edit sits on a now-stale base; abort it.
    Conflict,
}

pub fn classify(local: Option<&Revision>, remote: &Revision, local_pending: bool) -> Staleness {
    match local {
        Some(l) if l == remote => Staleness::Unchanged,
        _ if local_pending => Staleness::Conflict,
        _ => Staleness::RemoteAhead,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rev(s: &str) -> Revision {
        Revision(s.to_string())
    }

    #[test]
    fn equal_markers_are_unchanged() {
        assert_eq!(
            classify(Some(&rev("a")), &rev("a"), false),
            Staleness::Unchanged
        );
        // A pending edit against an unchanged base is not a conflict.
        assert_eq!(
            classify(Some(&rev("a")), &rev("a"), true),
            Staleness::Unchanged
        );
    }

    #[test]
    fn remote_ahead_without_pending_edit() {
        assert_eq!(
            classify(Some(&rev("a")), &rev("b"), false),
            Staleness::RemoteAhead
        );
        assert_eq!(classify(None, &rev("b"), false), Staleness::RemoteAhead);
    }

    #[test]
    fn pending_edit_on_stale_base_is_a_conflict() {
        assert_eq!(
            classify(Some(&rev("a")), &rev("b"), true),
            Staleness::Conflict
        );
        assert_eq!(classify(None, &rev("b"), true), Staleness::Conflict);
    }
}
