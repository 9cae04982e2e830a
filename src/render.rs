//! HTML rendering for the console pages. Tables and rows are built as plain
//! strings with everything user-controlled escaped on the way in.

use crate::{
    forms::FormKind,
    models::{Beer, Bonus, Brewery, FieldErrors, Player},
    queue::{Row, ValidationQueue},
};

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = "body{font-family:sans-serif;margin:2em}\
table.entity-table{border-collapse:collapse}\
table.entity-table td,table.entity-table th{border:1px solid #ccc;padding:4px 8px}\
.checkin-even{background:#f4f4f4}\
.alert-danger{color:#a00;border:1px solid #a00;padding:6px}\
.alert-success{color:#080;border:1px solid #080;padding:6px}\
.has-error input{border-color:#a00}\
.help-block{color:#a00;display:block}";

pub fn page(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title>\
         <style>{STYLE}</style></head>\n\
         <body>\n{}\n</body>\n</html>\n",
        escape(title),
        body
    )
}

pub fn error_page(message: &str) -> String {
    page(
        "Error",
        &format!("<div class=\"alert alert-danger\">{}</div>", escape(message)),
    )
}

pub fn alert(text: &str, is_error: bool) -> String {
    let style = if is_error { "alert-danger" } else { "alert-success" };
    format!("<div class=\"alert {style}\" role=\"alert\">{}</div>", escape(text))
}

pub fn beer_table(contest_id: u64, beers: &[Beer], editing: bool) -> String {
    let mut html = String::from(
        "<table class=\"entity-table beer-table\">\n\
         <tr><th>Beer</th><th>Brewery</th><th>State</th><th>Points</th><th>Checkin</th></tr>\n",
    );
    if beers.is_empty() {
        html.push_str("<tr><td colspan=\"5\">No beers added to the contest yet</td></tr>\n");
    }
    for beer in beers {
        html.push_str(&format!(
            "<tr id=\"beer-{}\" class=\"beer-row{}\">\
             <td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>{}</tr>\n",
            beer.id,
            if beer.checked_into { " beer-checkedin" } else { "" },
            escape(&beer.name),
            escape(&beer.brewery),
            escape(beer.brewery_state.as_deref().unwrap_or("")),
            beer.point_value,
            if beer.checked_into { "&#10003;" } else { "" },
            delete_cell(editing, contest_id, "beers", beer.id),
        ));
    }
    html.push_str("</table>\n");
    html
}

pub fn brewery_table(contest_id: u64, breweries: &[Brewery], editing: bool) -> String {
    let mut html = String::from(
        "<table class=\"entity-table brewery-table\">\n\
         <tr><th>Brewery</th><th>Location</th><th>Points</th></tr>\n",
    );
    if breweries.is_empty() {
        html.push_str("<tr><td colspan=\"3\">No breweries added to the contest yet</td></tr>\n");
    }
    for brewery in breweries {
        html.push_str(&format!(
            "<tr id=\"brewery-{}\" class=\"brewery-row\">\
             <td>{}</td><td>{}</td><td>{}</td>{}</tr>\n",
            brewery.id,
            match &brewery.untappd_url {
                Some(url) => format!(
                    "<a href=\"{}\" target=\"_blank\">{}</a>",
                    escape(url),
                    escape(&brewery.name)
                ),
                None => escape(&brewery.name),
            },
            escape(brewery.location.as_deref().unwrap_or("")),
            brewery.point_value,
            delete_cell(editing, contest_id, "breweries", brewery.id),
        ));
    }
    html.push_str("</table>\n");
    html
}

pub fn bonus_table(contest_id: u64, bonuses: &[Bonus], editing: bool) -> String {
    let mut html = String::from(
        "<table class=\"entity-table bonus-table\">\n\
         <tr><th>Bonus</th><th>Description</th><th>Tags</th><th>Points</th></tr>\n",
    );
    if bonuses.is_empty() {
        html.push_str("<tr><td colspan=\"4\">No bonuses added to the contest yet</td></tr>\n");
    }
    for bonus in bonuses {
        html.push_str(&format!(
            "<tr id=\"bonus-{}\" class=\"bonus-row\">\
             <td>{}</td><td>{}</td><td>{}</td><td>{}</td>{}</tr>\n",
            bonus.id,
            escape(&bonus.name),
            escape(&bonus.description),
            escape(&bonus.hash_tags.join(", ")),
            bonus.point_value,
            delete_cell(editing, contest_id, "bonuses", bonus.id),
        ));
    }
    html.push_str("</table>\n");
    html
}

pub fn leaderboard(players: &[Player]) -> String {
    let mut html = String::from(
        "<table class=\"entity-table leaderboard\">\n\
         <tr><th>Rank</th><th>Player</th><th>Beers</th><th>Points</th></tr>\n",
    );
    for player in players {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            player.rank.map(|r| r.to_string()).unwrap_or_default(),
            escape(&player.username),
            player.beer_count,
            player.total_points,
        ));
    }
    html.push_str("</table>\n");
    html
}

fn delete_cell(editing: bool, contest_id: u64, plural: &str, id: u64) -> String {
    if !editing {
        return String::new();
    }
    format!(
        "<td><form method=\"post\" action=\"/contests/{contest_id}/{plural}/{id}/delete\">\
         <button type=\"submit\" class=\"btn\" aria-label=\"Delete\">&#10007;</button>\
         </form></td>"
    )
}

/// Add-entity panel. Previously submitted values are kept so a rejected form
/// comes back filled in, with help text under each offending field.
pub fn entity_form(
    contest_id: u64,
    kind: FormKind,
    values: &std::collections::HashMap<String, String>,
    errors: &FieldErrors,
    notice: Option<&str>,
) -> String {
    let mut html = format!(
        "<form method=\"post\" action=\"/contests/{contest_id}/{}\" class=\"add-{}\">\n",
        kind.plural(),
        kind.label()
    );
    if let Some(text) = notice {
        html.push_str(&alert(text, !errors.0.is_empty()));
    }
    for message in errors.form_wide() {
        html.push_str(&format!(
            "<div class=\"alert alert-danger\">{}</div>\n",
            escape(message)
        ));
    }
    for field in kind.base_fields() {
        let value = values.get(*field).map(String::as_str).unwrap_or("");
        let field_errors = errors.field(field);
        html.push_str(&format!(
            "<div class=\"form-group{}\"><label for=\"{field}\">{field}</label>\
             <input id=\"{field}\" name=\"{field}\" class=\"form-control\" value=\"{}\">{}</div>\n",
            if field_errors.is_empty() { "" } else { " has-error" },
            escape(value),
            field_errors
                .iter()
                .map(|m| format!("<span class=\"help-block\">{}</span>", escape(m)))
                .collect::<String>(),
        ));
    }
    html.push_str(&format!(
        "<button type=\"submit\" class=\"btn btn-primary\">Add {}</button>\n</form>\n",
        kind.label()
    ));
    html
}

/// The match dropdown for one queue row: contest beers then breweries, with
/// `beer:{id}` / `brewery:{id}` values the decision handler parses back.
fn match_select(row: &Row, beers: &[Beer], breweries: &[Brewery]) -> String {
    use crate::models::Target;

    let mut html = format!(
        "<select name=\"selection\" id=\"id_{}_select\" class=\"beer-select\">\n\
         <option value=\"\">Select a beer or brewery</option>\n",
        row.checkin.id
    );
    for beer in beers {
        html.push_str(&format!(
            "<option value=\"beer:{}\"{}>{}</option>\n",
            beer.id,
            if row.state.selection == Some(Target::Beer(beer.id)) {
                " selected"
            } else {
                ""
            },
            escape(&beer.name),
        ));
    }
    for brewery in breweries {
        html.push_str(&format!(
            "<option value=\"brewery:{}\"{}>{}</option>\n",
            brewery.id,
            if row.state.selection == Some(Target::Brewery(brewery.id)) {
                " selected"
            } else {
                ""
            },
            escape(&brewery.name),
        ));
    }
    html.push_str("</select>\n");
    html
}

fn queue_row(
    contest_id: u64,
    page_index: u32,
    row: &Row,
    beers: &[Beer],
    breweries: &[Brewery],
    bonuses: &[Bonus],
    even: bool,
) -> String {
    let checkin = &row.checkin;
    let mut html = format!(
        "<div class=\"checkin-row checkin-{}\" id=\"id_{}_row\">\n\
         <em>{}</em>\n\
         <a href=\"{}\" target=\"_blank\"><em>{} from {}</em></a>\n\
         <span class=\"checkin-date\">{}</span>\n\
         <form method=\"post\" action=\"/contests/{contest_id}/validate\">\n\
         <input type=\"hidden\" name=\"checkin\" value=\"{}\">\n\
         <input type=\"hidden\" name=\"page\" value=\"{page_index}\">\n",
        if even { "even" } else { "odd" },
        checkin.id,
        escape(&checkin.player),
        escape(&checkin.checkin_url),
        escape(&checkin.beer),
        escape(&checkin.brewery),
        checkin.checkin_date.format("%m/%d/%Y"),
        checkin.id,
    );
    html.push_str(&match_select(row, beers, breweries));
    for bonus in bonuses {
        html.push_str(&format!(
            "<label><input type=\"checkbox\" name=\"bonuses\" value=\"{}\"{} \
             class=\"bonus-checkbox\">{}</label>\n",
            escape(&bonus.name),
            if row.state.bonuses.contains(&bonus.name) {
                " checked"
            } else {
                ""
            },
            escape(&bonus.name),
        ));
    }
    let can_submit = row.state.selection.is_some() || !row.state.bonuses.is_empty();
    html.push_str(&format!(
        "<button type=\"submit\" class=\"btn btn-primary validation-click\"{}>Validate</button>\n\
         </form>\n\
         <form method=\"post\" action=\"/contests/{contest_id}/dismiss\">\n\
         <input type=\"hidden\" name=\"checkin\" value=\"{}\">\n\
         <input type=\"hidden\" name=\"page\" value=\"{page_index}\">\n\
         <button type=\"submit\" class=\"btn dismissal-click\">Dismiss</button>\n\
         </form>\n</div>\n",
        if can_submit { "" } else { " disabled" },
        checkin.id,
    ));
    html
}

fn pagination(contest_id: u64, queue: &ValidationQueue) -> String {
    let mut html = String::from("<div class=\"step-links\">\n");
    let href = |page: u32| format!("/contests/{contest_id}/validate?page={page}");
    if queue.has_previous() {
        html.push_str(&format!("<a href=\"{}\">first</a>\n", href(1)));
        if queue.page > 2 {
            html.push_str(&format!("<a href=\"{}\">previous</a>\n", href(queue.page - 1)));
        }
    }
    html.push_str(&format!(
        "<span id=\"page-description\" class=\"current\">Page {} of {}</span>\n",
        queue.page,
        queue.page_count.max(1)
    ));
    if queue.has_next() {
        if queue.page < queue.page_count - 1 {
            html.push_str(&format!("<a href=\"{}\">next</a>\n", href(queue.page + 1)));
        }
        html.push_str(&format!("<a href=\"{}\">last</a>\n", href(queue.page_count)));
    }
    html.push_str("</div>\n");
    html
}

pub fn queue_page(
    contest_id: u64,
    queue: &ValidationQueue,
    beers: &[Beer],
    breweries: &[Brewery],
    bonuses: &[Bonus],
    notice: Option<&str>,
) -> String {
    let mut body = String::from("<h1>Unvalidated checkins</h1>\n");
    if let Some(text) = notice {
        body.push_str(&alert(text, true));
    }
    body.push_str("<div class=\"checkin-list\">\n");
    if queue.is_empty() {
        body.push_str("<p>Nothing left to validate.</p>\n");
    }
    for (i, row) in queue.rows().iter().enumerate() {
        body.push_str(&queue_row(
            contest_id,
            queue.page,
            row,
            beers,
            breweries,
            bonuses,
            i % 2 == 0,
        ));
    }
    body.push_str("</div>\n");
    body.push_str(&pagination(contest_id, queue));
    page("Validate checkins", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CheckinPage;
    use std::collections::HashMap;

    fn beer(id: u64, name: &str, checked: bool) -> Beer {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": name,
            "brewery": "Bells",
            "brewery_state": "MI",
            "point_value": 2,
            "checked_into": checked,
        }))
        .unwrap()
    }

    // Page 2 of 3 as the upstream reports it: page_index derived from the
    // 0-based slice offsets.
    fn queue_of(checkins: serde_json::Value) -> ValidationQueue {
        let page: CheckinPage = serde_json::from_value(serde_json::json!({
            "page_count": 3,
            "page_index": 1,
            "page_size": 25,
            "checkins": checkins,
        }))
        .unwrap();
        ValidationQueue::from_page(2, page)
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b>&\"c\"'d'"), "a&lt;b&gt;&amp;&quot;c&quot;&#39;d&#39;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_beer_table_rows_and_marker() {
        let html = beer_table(
            7,
            &[beer(1, "Hop Slam", true), beer(2, "Two Hearted", false)],
            true,
        );
        assert!(html.contains("id=\"beer-1\""));
        assert!(html.contains("beer-checkedin"));
        assert!(html.contains("&#10003;"));
        assert!(html.contains("/contests/7/beers/2/delete"));
        assert!(!html.contains("No beers added"));
    }

    #[test]
    fn test_empty_tables_show_placeholder() {
        assert!(beer_table(7, &[], false).contains("No beers added to the contest yet"));
        assert!(brewery_table(7, &[], false).contains("No breweries added"));
        assert!(bonus_table(7, &[], false).contains("No bonuses added"));
    }

    #[test]
    fn test_read_only_table_has_no_delete() {
        let html = beer_table(7, &[beer(1, "Hop Slam", false)], false);
        assert!(!html.contains("delete"));
    }

    #[test]
    fn test_escaped_entity_name() {
        let html = beer_table(7, &[beer(1, "<script>alert(1)</script>", false)], false);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_queue_row_preselects_candidate_and_enables_submit() {
        let queue = queue_of(serde_json::json!([{
            "id": 17,
            "player": "norpa",
            "checkin_url": "https://untappd.com/user/norpa/checkin/1",
            "beer": "Hop Slam",
            "brewery": "Bells",
            "checkin_date": "06/17/2018",
            "possible_id": 1,
            "possible_name": "Hop Slam"
        }]));
        let html = queue_page(7, &queue, &[beer(1, "Hop Slam", false)], &[], &[], None);
        assert!(html.contains("value=\"beer:1\" selected"));
        assert!(html.contains("validation-click\">Validate"));
        assert!(!html.contains("validation-click\" disabled"));
    }

    #[test]
    fn test_queue_row_without_selection_is_disabled() {
        let queue = queue_of(serde_json::json!([{
            "id": 18,
            "player": "wadell",
            "checkin_url": "https://untappd.com/user/wadell/checkin/2",
            "beer": "Mystery",
            "brewery": "Nowhere",
            "checkin_date": "06/18/2018"
        }]));
        let html = queue_page(7, &queue, &[beer(1, "Hop Slam", false)], &[], &[], None);
        assert!(html.contains(" disabled>Validate"));
    }

    #[test]
    fn test_pagination_middle_page_has_all_links() {
        let queue = queue_of(serde_json::json!([{
            "id": 18,
            "player": "wadell",
            "checkin_url": "u",
            "beer": "b",
            "brewery": "w",
            "checkin_date": "06/18/2018"
        }]));
        // Page 2 of 3: first on the left, last on the right.
        let html = pagination(7, &queue);
        assert!(html.contains(">first</a>"));
        assert!(html.contains(">last</a>"));
        assert!(html.contains("Page 2 of 3"));
        assert!(!html.contains(">previous</a>"));
        assert!(!html.contains(">next</a>"));
    }

    #[test]
    fn test_form_renders_field_errors() {
        let errors: FieldErrors = serde_json::from_str(
            r#"{ "name": ["This field is required."], "non_field_errors": ["nope"] }"#,
        )
        .unwrap();
        let mut values = HashMap::new();
        values.insert("point_value".to_string(), "3".to_string());
        let html = entity_form(
            7,
            FormKind::Brewery,
            &values,
            &errors,
            Some("Failed to add brewery"),
        );
        assert!(html.contains("action=\"/contests/7/breweries\""));
        assert!(html.contains("has-error"));
        assert!(html.contains("This field is required."));
        assert!(html.contains("alert-danger"));
        assert!(html.contains("value=\"3\""));
    }
}
