use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;
use tracing::info;

use crate::{
    api::ContestApi,
    error::AppError,
    forms::{self, FormKind},
    models::FieldErrors,
    queue::{clamp_page, parse_selection, ValidationQueue},
    render,
    state::AppState,
};

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

#[derive(Deserialize)]
pub struct LookupQuery {
    pub url: String,
}

/// Repeated keys (the bonus checkboxes) come through as raw pairs; split them
/// from the single-valued fields.
fn form_fields(pairs: Vec<(String, String)>) -> (HashMap<String, String>, Vec<String>) {
    let mut fields = HashMap::new();
    let mut bonuses = Vec::new();
    for (key, value) in pairs {
        if key == "bonuses" {
            bonuses.push(value);
        } else {
            fields.insert(key, value);
        }
    }
    (fields, bonuses)
}

fn required_u64(fields: &HashMap<String, String>, name: &str) -> Result<u64, AppError> {
    fields
        .get(name)
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| AppError::MalformedRequest(format!("Expected integer field '{name}'")))
}

fn page_field(fields: &HashMap<String, String>) -> u32 {
    fields
        .get("page")
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(1)
}

struct FormSlot {
    kind: FormKind,
    values: HashMap<String, String>,
    errors: FieldErrors,
    notice: String,
}

/// Contest overview: leaderboard plus the three entity tables, each with its
/// add panel. `slot` carries a rejected form back filled in.
async fn overview_html(api: &ContestApi, slot: Option<&FormSlot>) -> Result<String, AppError> {
    let contest = api.contest().await?;
    let beers = api.beers().await?;
    let breweries = api.breweries().await?;
    let bonuses = api.bonuses().await?;
    let players = api.players().await?;

    let mut body = format!(
        "<h1>{}</h1>\n<p class=\"contest-dates\">{} to {}{}</p>\n",
        render::escape(&contest.name),
        render::escape(&contest.start_date),
        render::escape(&contest.end_date),
        if contest.active { " (active)" } else { "" },
    );
    body.push_str(&format!(
        "<p><a href=\"/contests/{}/validate\">Validate checkins</a></p>\n",
        api.contest_id()
    ));
    body.push_str("<h2>Leaderboard</h2>\n");
    body.push_str(&render::leaderboard(&players));

    let contest_id = api.contest_id();
    let empty_values = HashMap::new();
    let empty_errors = FieldErrors::default();
    let sections: [(FormKind, String); 3] = [
        (FormKind::Beer, render::beer_table(contest_id, &beers, true)),
        (
            FormKind::Brewery,
            render::brewery_table(contest_id, &breweries, true),
        ),
        (FormKind::Bonus, render::bonus_table(contest_id, &bonuses, true)),
    ];
    for (kind, table) in sections {
        body.push_str(&format!("<h2>{}</h2>\n", capitalize(kind.plural())));
        body.push_str(&table);
        match slot {
            Some(slot) if slot.kind == kind => {
                body.push_str(&render::entity_form(
                    contest_id,
                    kind,
                    &slot.values,
                    &slot.errors,
                    Some(&slot.notice),
                ));
            }
            _ => body.push_str(&render::entity_form(
                contest_id,
                kind,
                &empty_values,
                &empty_errors,
                None,
            )),
        }
    }
    Ok(render::page(&contest.name, &body))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

pub async fn contest_overview(
    State(state): State<Arc<AppState>>,
    Path(contest_id): Path<u64>,
) -> Result<Html<String>, AppError> {
    let api = state.api(contest_id);
    Ok(Html(overview_html(&api, None).await?))
}

async fn queue_html(
    api: &ContestApi,
    queue: &ValidationQueue,
    notice: Option<&str>,
) -> Result<String, AppError> {
    let beers = api.beers().await?;
    let breweries = api.breweries().await?;
    let bonuses = api.bonuses().await?;
    Ok(render::queue_page(
        api.contest_id(),
        queue,
        &beers,
        &breweries,
        &bonuses,
        notice,
    ))
}

async fn load_queue(api: &ContestApi, page: u32) -> Result<ValidationQueue, AppError> {
    let page = page.max(1);
    let fetched = api.unvalidated_checkins(page).await?;
    // A stale link can point past the end after other edits drained the
    // queue; fall back to the last page the server still has.
    if fetched.checkins.is_empty() && page > clamp_page(page, fetched.page_count) {
        let page = clamp_page(page, fetched.page_count);
        return Ok(ValidationQueue::from_page(
            page,
            api.unvalidated_checkins(page).await?,
        ));
    }
    Ok(ValidationQueue::from_page(page, fetched))
}

pub async fn validation_page(
    State(state): State<Arc<AppState>>,
    Path(contest_id): Path<u64>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, AppError> {
    let api = state.api(contest_id);
    let queue = load_queue(&api, query.page.unwrap_or(1)).await?;
    Ok(Html(queue_html(&api, &queue, None).await?))
}

/// Commits one validation decision, optimistically drops the row, and sends
/// the operator to whichever page the queue says comes next. A rejected
/// decision leaves the row in place with the server's complaint on top.
pub async fn submit_decision(
    State(state): State<Arc<AppState>>,
    Path(contest_id): Path<u64>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let (fields, bonuses) = form_fields(pairs);
    let checkin = required_u64(&fields, "checkin")?;
    let api = state.api(contest_id);
    let mut queue = load_queue(&api, page_field(&fields)).await?;

    let selection = parse_selection(fields.get("selection").map(String::as_str).unwrap_or(""))?;
    queue.select(checkin, selection)?;
    for tag in &bonuses {
        queue.toggle_bonus(checkin, tag)?;
    }

    let decision = queue.decision(checkin)?;
    match api.validate(&decision).await {
        Ok(()) => {
            info!("Validated checkin {checkin} in contest {contest_id}");
            queue.remove(checkin);
            Ok(redirect_to_queue(contest_id, queue.next_page()))
        }
        Err(error) => Ok(Html(queue_html(&api, &queue, Some(&error.to_string())).await?)
            .into_response()),
    }
}

pub async fn dismiss_checkin(
    State(state): State<Arc<AppState>>,
    Path(contest_id): Path<u64>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let (fields, _) = form_fields(pairs);
    let checkin = required_u64(&fields, "checkin")?;
    let api = state.api(contest_id);
    let mut queue = load_queue(&api, page_field(&fields)).await?;

    match api.dismiss(checkin).await {
        Ok(()) => {
            info!("Dismissed checkin {checkin} in contest {contest_id}");
            queue.remove(checkin);
            Ok(redirect_to_queue(contest_id, queue.next_page()))
        }
        Err(error) => Ok(Html(queue_html(&api, &queue, Some(&error.to_string())).await?)
            .into_response()),
    }
}

fn redirect_to_queue(contest_id: u64, page: u32) -> Response {
    Redirect::to(&format!("/contests/{contest_id}/validate?page={page}")).into_response()
}

/// Add-entity submit: POST the built body upstream, clear the form by
/// redirecting on success, or re-render the overview with the field errors
/// mapped back onto the panel.
pub async fn add_entity(
    State(state): State<Arc<AppState>>,
    Path((contest_id, plural)): Path<(u64, String)>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let kind = FormKind::from_plural(&plural)
        .ok_or_else(|| AppError::MalformedRequest(format!("No such entity list: {plural}")))?;
    let (fields, _) = form_fields(pairs);
    let api = state.api(contest_id);

    let submitted = match forms::build_payload(kind, &fields) {
        Ok(body) => api.add_entity(kind.plural(), &body).await.map(|()| body),
        Err(error) => Err(error),
    };
    match submitted {
        Ok(body) => {
            info!("{}", forms::success_message(kind, &body));
            Ok(Redirect::to(&format!("/contests/{contest_id}")).into_response())
        }
        Err(error) => {
            let slot = FormSlot {
                kind,
                values: fields.clone(),
                errors: forms::as_field_errors(&error),
                notice: forms::failure_message(kind, &fields),
            };
            Ok(Html(overview_html(&api, Some(&slot)).await?).into_response())
        }
    }
}

pub async fn delete_entity(
    State(state): State<Arc<AppState>>,
    Path((contest_id, plural, entity_id)): Path<(u64, String, u64)>,
) -> Result<Redirect, AppError> {
    let kind = FormKind::from_plural(&plural)
        .ok_or_else(|| AppError::MalformedRequest(format!("No such entity list: {plural}")))?;
    let api = state.api(contest_id);
    api.delete_entity(kind.plural(), entity_id).await?;
    info!("Deleted {} {entity_id} from contest {contest_id}", kind.label());
    Ok(Redirect::to(&format!("/contests/{contest_id}")))
}

/// JSON passthrough used to prefill the add forms from an Untappd page URL.
pub async fn lookup(
    State(state): State<Arc<AppState>>,
    Path((contest_id, kind)): Path<(u64, String)>,
    Query(query): Query<LookupQuery>,
) -> Result<Response, AppError> {
    let api = state.api(contest_id);
    match kind.as_str() {
        "beer" => Ok(Json(api.lookup_beer(&query.url).await?).into_response()),
        "brewery" => Ok(Json(api.lookup_brewery(&query.url).await?).into_response()),
        other => Err(AppError::MalformedRequest(format!(
            "No such lookup: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_fields_splits_bonuses() {
        let (fields, bonuses) = form_fields(vec![
            ("checkin".to_string(), "17".to_string()),
            ("bonuses".to_string(), "trump".to_string()),
            ("selection".to_string(), "beer:4".to_string()),
            ("bonuses".to_string(), "ballpark".to_string()),
        ]);
        assert_eq!(fields.get("checkin").unwrap(), "17");
        assert_eq!(fields.get("selection").unwrap(), "beer:4");
        assert_eq!(bonuses, ["trump", "ballpark"]);
    }

    #[test]
    fn test_required_u64() {
        let (fields, _) = form_fields(vec![("checkin".to_string(), "17".to_string())]);
        assert_eq!(required_u64(&fields, "checkin").unwrap(), 17);
        assert!(required_u64(&fields, "page").is_err());
    }

    #[test]
    fn test_page_field_defaults_to_first() {
        let (fields, _) = form_fields(vec![("page".to_string(), "oops".to_string())]);
        assert_eq!(page_field(&fields), 1);
        let (fields, _) = form_fields(vec![("page".to_string(), "3".to_string())]);
        assert_eq!(page_field(&fields), 3);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("beers"), "Beers");
        assert_eq!(capitalize(""), "");
    }
}
