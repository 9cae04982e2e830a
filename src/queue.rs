//! # Validation queue
//!
//! The review workflow for unvalidated checkins. One page of checkins is held
//! in memory with per-row operator state: the selected beer/brewery match and
//! the checked bonus tags. A row may be committed once it has a match or at
//! least one bonus; after a commit or dismissal the row is removed
//! optimistically and the queue decides which page to show next.

use crate::{
    error::AppError,
    models::{Checkin, CheckinPage, Decision, Target},
};

/// 0-based slice bounds for a 1-based page index.
pub fn slice_bounds(page: u32, size: u32) -> (u32, u32) {
    let start = page.saturating_sub(1) * size;
    (start, start + size)
}

/// Keeps a requested page inside the range the server reported. A drained
/// queue reports zero pages; page 1 is still the one to render.
pub fn clamp_page(page: u32, page_count: u32) -> u32 {
    page.clamp(1, page_count.max(1))
}

#[derive(Debug, Default, Clone)]
pub struct RowState {
    pub selection: Option<Target>,
    pub bonuses: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Row {
    pub checkin: Checkin,
    pub state: RowState,
}

pub struct ValidationQueue {
    pub page: u32,
    pub page_count: u32,
    rows: Vec<Row>,
}

impl ValidationQueue {
    /// Builds the view state for one fetched page. `requested` is the page
    /// the caller asked for; the envelope's `page_index` is derived upstream
    /// from the raw slice offsets and is 0-based, so only `page_count` is
    /// read from it. A checkin that arrived with a candidate match starts
    /// with that beer selected, so the operator can commit it in one click.
    pub fn from_page(requested: u32, page: CheckinPage) -> Self {
        let rows = page
            .checkins
            .into_iter()
            .map(|checkin| {
                let selection = checkin.possible_id.map(Target::Beer);
                Row {
                    checkin,
                    state: RowState {
                        selection,
                        bonuses: Vec::new(),
                    },
                }
            })
            .collect();
        ValidationQueue {
            page: requested.max(1),
            page_count: page.page_count,
            rows,
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn row_mut(&mut self, checkin_id: u64) -> Result<&mut Row, AppError> {
        self.rows
            .iter_mut()
            .find(|row| row.checkin.id == checkin_id)
            .ok_or_else(|| {
                AppError::MalformedRequest(format!("No checkin {checkin_id} on this page"))
            })
    }

    fn row(&self, checkin_id: u64) -> Result<&Row, AppError> {
        self.rows
            .iter()
            .find(|row| row.checkin.id == checkin_id)
            .ok_or_else(|| {
                AppError::MalformedRequest(format!("No checkin {checkin_id} on this page"))
            })
    }

    pub fn select(&mut self, checkin_id: u64, target: Option<Target>) -> Result<(), AppError> {
        self.row_mut(checkin_id)?.state.selection = target;
        Ok(())
    }

    pub fn toggle_bonus(&mut self, checkin_id: u64, tag: &str) -> Result<bool, AppError> {
        let bonuses = &mut self.row_mut(checkin_id)?.state.bonuses;
        if let Some(index) = bonuses.iter().position(|t| t == tag) {
            bonuses.remove(index);
            Ok(false)
        } else {
            bonuses.push(tag.to_string());
            Ok(true)
        }
    }

    /// Submit is enabled once a match is selected or at least one bonus is
    /// checked.
    pub fn can_submit(&self, checkin_id: u64) -> bool {
        self.row(checkin_id)
            .map(|row| row.state.selection.is_some() || !row.state.bonuses.is_empty())
            .unwrap_or(false)
    }

    /// The decision payload for a row, or an error if the row has nothing to
    /// commit. The row itself stays put until the upstream call succeeds.
    pub fn decision(&self, checkin_id: u64) -> Result<Decision, AppError> {
        let row = self.row(checkin_id)?;
        if row.state.selection.is_none() && row.state.bonuses.is_empty() {
            return Err(AppError::MalformedRequest(format!(
                "Checkin {checkin_id} has no match or bonuses selected"
            )));
        }
        Ok(Decision::new(
            checkin_id,
            row.state.selection,
            row.state.bonuses.clone(),
        ))
    }

    /// Optimistic removal after the upstream accepted a decision or
    /// dismissal.
    pub fn remove(&mut self, checkin_id: u64) -> bool {
        let before = self.rows.len();
        self.rows.retain(|row| row.checkin.id != checkin_id);
        self.rows.len() != before
    }

    /// Which page to fetch after a removal: step back when the current page
    /// drained, otherwise re-fetch in place so the next checkin slides up.
    pub fn next_page(&self) -> u32 {
        if self.rows.is_empty() {
            self.page.saturating_sub(1).max(1)
        } else {
            self.page
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count
    }
}

/// Parses the `beer:{id}` / `brewery:{id}` option values the match dropdown
/// posts back. An empty value means no match was chosen.
pub fn parse_selection(raw: &str) -> Result<Option<Target>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let (kind, id) = raw
        .split_once(':')
        .ok_or_else(|| AppError::MalformedRequest(format!("Bad selection: {raw}")))?;
    let id: u64 = id
        .parse()
        .map_err(|_| AppError::MalformedRequest(format!("Bad selection id: {raw}")))?;
    match kind {
        "beer" => Ok(Some(Target::Beer(id))),
        "brewery" => Ok(Some(Target::Brewery(id))),
        _ => Err(AppError::MalformedRequest(format!(
            "Bad selection kind: {raw}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkin(id: u64, beer: &str, possible: Option<u64>) -> serde_json::Value {
        let mut value = serde_json::json!({
            "id": id,
            "player": "norpa",
            "checkin_url": format!("https://untappd.com/user/norpa/checkin/{id}"),
            "beer": beer,
            "brewery": "Bells",
            "checkin_date": "06/17/2018"
        });
        if let Some(pid) = possible {
            value["possible_id"] = serde_json::json!(pid);
            value["possible_name"] = serde_json::json!(beer);
        }
        value
    }

    fn page(index: u32, count: u32, checkins: Vec<serde_json::Value>) -> CheckinPage {
        serde_json::from_value(serde_json::json!({
            "page_count": count,
            "page_index": index,
            "page_size": 25,
            "checkins": checkins,
        }))
        .unwrap()
    }

    #[test]
    fn test_slice_bounds() {
        assert_eq!(slice_bounds(1, 25), (0, 25));
        assert_eq!(slice_bounds(2, 25), (25, 50));
        assert_eq!(slice_bounds(0, 25), (0, 25));
    }

    #[test]
    fn test_clamp_page() {
        assert_eq!(clamp_page(0, 4), 1);
        assert_eq!(clamp_page(3, 4), 3);
        assert_eq!(clamp_page(9, 4), 4);
        assert_eq!(clamp_page(1, 0), 1);
    }

    #[test]
    fn test_candidate_match_preselects_and_enables_submit() {
        let queue = ValidationQueue::from_page(
            1,
            page(
                0,
                1,
                vec![checkin(10, "Hop Slam", Some(4)), checkin(11, "Mystery", None)],
            ),
        );
        assert!(queue.can_submit(10));
        assert!(!queue.can_submit(11));
        assert_eq!(queue.rows()[0].state.selection, Some(Target::Beer(4)));
    }

    #[test]
    fn test_submit_enabled_by_match_or_bonus() {
        let mut queue =
            ValidationQueue::from_page(1, page(0, 1, vec![checkin(11, "Mystery", None)]));
        assert!(!queue.can_submit(11));

        assert!(queue.toggle_bonus(11, "trump").unwrap());
        assert!(queue.can_submit(11));
        assert!(!queue.toggle_bonus(11, "trump").unwrap());
        assert!(!queue.can_submit(11));

        queue.select(11, Some(Target::Brewery(8))).unwrap();
        assert!(queue.can_submit(11));
        queue.select(11, None).unwrap();
        assert!(!queue.can_submit(11));
    }

    #[test]
    fn test_decision_payloads() {
        let mut queue =
            ValidationQueue::from_page(1, page(0, 1, vec![checkin(10, "Hop Slam", Some(4))]));
        assert_eq!(
            queue.decision(10).unwrap(),
            Decision::new(10, Some(Target::Beer(4)), vec![])
        );

        queue.toggle_bonus(10, "ballpark").unwrap();
        queue.select(10, Some(Target::Brewery(2))).unwrap();
        assert_eq!(
            queue.decision(10).unwrap(),
            Decision::new(10, Some(Target::Brewery(2)), vec!["ballpark".to_string()])
        );
    }

    #[test]
    fn test_decision_requires_something_selected() {
        let queue = ValidationQueue::from_page(1, page(0, 1, vec![checkin(11, "Mystery", None)]));
        assert!(queue.decision(11).is_err());
        assert!(queue.decision(999).is_err());
    }

    #[test]
    fn test_removal_repaginates() {
        // Two rows left on page 2: removal keeps us on page 2.
        let mut queue = ValidationQueue::from_page(
            2,
            page(1, 3, vec![checkin(20, "A", None), checkin(21, "B", None)]),
        );
        assert!(queue.remove(20));
        assert_eq!(queue.next_page(), 2);

        // Last row gone: step back one page.
        assert!(queue.remove(21));
        assert_eq!(queue.next_page(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_removal_on_first_page_stays_on_first() {
        let mut queue = ValidationQueue::from_page(1, page(0, 1, vec![checkin(20, "A", None)]));
        queue.remove(20);
        assert_eq!(queue.next_page(), 1);
    }

    #[test]
    fn test_remove_unknown_row_is_noop() {
        let mut queue = ValidationQueue::from_page(1, page(0, 1, vec![checkin(20, "A", None)]));
        assert!(!queue.remove(999));
        assert_eq!(queue.rows().len(), 1);
    }

    #[test]
    fn test_requested_page_drives_numbering() {
        // The upstream derives page_index as ceil(slice_start / page_size),
        // which is 0-based for the 0-based slices this client sends. The
        // queue must number itself from the page that was requested.
        let (start, _end) = slice_bounds(2, 25);
        let upstream_index = start.div_ceil(25);
        assert_eq!(upstream_index, 1);

        let queue =
            ValidationQueue::from_page(2, page(upstream_index, 3, vec![checkin(20, "A", None)]));
        assert_eq!(queue.page, 2);
        assert!(queue.has_previous());
        assert!(queue.has_next());
        assert_eq!(queue.next_page(), 2);
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("beer:4").unwrap(), Some(Target::Beer(4)));
        assert_eq!(
            parse_selection("brewery:12").unwrap(),
            Some(Target::Brewery(12))
        );
        assert_eq!(parse_selection("").unwrap(), None);
        assert_eq!(parse_selection("  ").unwrap(), None);
        assert!(parse_selection("stout:4").is_err());
        assert!(parse_selection("beer:four").is_err());
        assert!(parse_selection("beer4").is_err());
    }

    #[test]
    fn test_pagination_flags() {
        let queue = ValidationQueue::from_page(2, page(1, 3, vec![checkin(20, "A", None)]));
        assert!(queue.has_previous());
        assert!(queue.has_next());

        let queue = ValidationQueue::from_page(1, page(0, 1, vec![]));
        assert!(!queue.has_previous());
        assert!(!queue.has_next());
    }
}
