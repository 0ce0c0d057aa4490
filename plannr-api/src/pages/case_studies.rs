/// Case studies page
///
/// The caller's own case-study tasks plus CMS case studies and templates.
/// Each CMS item carries `locked` from the tier policy. A CMS outage leaves
/// the lists empty and adds a notification; the page still renders.

use super::Page;
use crate::app::AppState;
use axum::{extract::State, Extension, Json};
use plannr_shared::{
    auth::{authorization::resolve_access_tier, AuthContext},
    cms::{CaseStudy, CmsError, ContentSource, Template},
    models::task::Task,
    resources::tasks::TasksResource,
    tier::{can_view_case_study, can_view_template, AccessTier},
};
use serde::Serialize;

/// CMS item with its visibility
#[derive(Debug, Serialize)]
pub struct Gated<T> {
    #[serde(flatten)]
    pub item: T,
    pub locked: bool,
}

#[derive(Debug, Serialize)]
pub struct CaseStudiesPage {
    pub own_case_studies: Vec<Task>,
    pub case_studies: Vec<Gated<CaseStudy>>,
    pub templates: Vec<Gated<Template>>,
}

fn gate<T>(
    items: Vec<T>,
    tier: AccessTier,
    can_view: fn(AccessTier, u32, u32) -> bool,
) -> Vec<Gated<T>> {
    let total = u32::try_from(items.len()).unwrap_or(u32::MAX);
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let index = u32::try_from(index).unwrap_or(u32::MAX);
            Gated {
                item,
                locked: !can_view(tier, index, total),
            }
        })
        .collect()
}

fn cms_result<T>(result: Result<Vec<T>, CmsError>, what: &str) -> (Vec<T>, Option<String>) {
    match result {
        Ok(items) => (items, None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load {} from CMS", what);
            (Vec::new(), Some(format!("Failed to load {}: {}", what, e)))
        }
    }
}

pub async fn case_studies_page(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Json<Page<CaseStudiesPage>> {
    let tier = match resolve_access_tier(state.store.as_ref(), auth.user_id).await {
        Ok(tier) => tier,
        Err(e) => return Json(Page::unavailable("case-studies", e)),
    };
    if !tier.is_subscribed() {
        return Json(Page::locked("case-studies", tier));
    }

    let (tasks, case_studies, templates) = tokio::join!(
        TasksResource::load(state.store.clone(), Some(auth.user_id)),
        state.cms.case_studies(),
        state.cms.templates(),
    );

    let (case_studies, case_studies_error) = cms_result(case_studies, "case studies");
    let (templates, templates_error) = cms_result(templates, "templates");
    let tasks_error = tasks.state().error;

    let page = CaseStudiesPage {
        own_case_studies: tasks.case_studies(),
        case_studies: gate(case_studies, tier, can_view_case_study),
        templates: gate(templates, tier, can_view_template),
    };

    Json(Page::open("case-studies", tier, page).with_errors([
        tasks_error,
        case_studies_error,
        templates_error,
    ]))
}
