use actix_web::{middleware, web, App, HttpResponse, HttpServer, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use crate::dispatch::{occupancy, run_assignment, sort_by_severity, AssignmentRun, Case, Hospital};
use crate::error::DispatchError;
use crate::parser::{load_cases_from_reader, load_hospitals_from_reader};
use crate::report::{validate_report, IncidentReport};

/// Cases, hospitals and the assignment derived from them, kept under one lock
/// so a stored assignment always matches the cases and hospitals beside it.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub cases: Vec<Case>,
    pub hospitals: Vec<Hospital>,
    pub assignment: Option<AssignmentRun>,
}

impl Snapshot {
    /// Reassigns from the full current cases and hospitals.
    pub fn recompute(&mut self) {
        self.assignment = Some(run_assignment(&self.cases, &self.hospitals));
    }

    /// Inserts a case, or replaces the one with the same id, then reassigns.
    pub fn upsert_case(&mut self, case: Case) {
        match self.cases.iter().position(|c| c.id == case.id) {
            Some(i) => self.cases[i] = case,
            None => self.cases.push(case),
        }
        self.recompute();
    }
}

pub struct AppState {
    pub snapshot: Mutex<Snapshot>,
    pub city_center: (f64, f64),
}

impl AppState {
    pub fn new(city_center: (f64, f64)) -> Self {
        AppState {
            snapshot: Mutex::new(Snapshot::default()),
            city_center,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| actix_web::error::ErrorInternalServerError("State lock poisoned"))
}

fn bad_request(err: DispatchError) -> HttpResponse {
    warn!(error = %err, "Rejected input");
    HttpResponse::BadRequest().json(serde_json::json!({
        "success": false,
        "error": err.to_string()
    }))
}

#[derive(Deserialize)]
pub struct AssignmentQuery {
    sort: Option<String>,
}

#[derive(Serialize)]
pub struct HospitalView {
    #[serde(flatten)]
    hospital: Hospital,
    occupancy: u8,
    incoming: u32,
}

#[derive(Serialize)]
pub struct StatsResponse {
    severity_counts: BTreeMap<String, u32>,
    place_counts: BTreeMap<String, u32>,
    hospital_counts: BTreeMap<String, u32>,
    unassigned: u32,
}

// Case CSV upload endpoint
async fn upload_cases(body: web::Bytes, state: web::Data<AppState>) -> Result<HttpResponse> {
    match load_cases_from_reader(&body[..], state.city_center) {
        Ok(cases) => {
            let count = cases.len();
            {
                let mut snapshot = lock(&state.snapshot)?;
                snapshot.cases = cases;
                snapshot.recompute();
            }
            info!(cases = count, "Case set replaced");
            Ok(HttpResponse::Ok().json(serde_json::json!({"success": true, "cases": count})))
        }
        Err(e) => Ok(bad_request(e)),
    }
}

// Hospital registry CSV upload endpoint
async fn upload_hospitals(body: web::Bytes, state: web::Data<AppState>) -> Result<HttpResponse> {
    match load_hospitals_from_reader(&body[..], state.city_center) {
        Ok(hospitals) => {
            let count = hospitals.len();
            {
                let mut snapshot = lock(&state.snapshot)?;
                snapshot.hospitals = hospitals;
                snapshot.recompute();
            }
            info!(hospitals = count, "Hospital registry replaced");
            Ok(HttpResponse::Ok().json(serde_json::json!({"success": true, "hospitals": count})))
        }
        Err(e) => Ok(bad_request(e)),
    }
}

// Single incident endpoint; replaces a case with the same id
async fn post_incident(
    report: web::Json<IncidentReport>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let report = report.into_inner();
    if let Err(e) = validate_report(&report) {
        return Ok(bad_request(e));
    }

    let case = report.into_case(state.city_center);
    let id = case.id.clone();
    let mut snapshot = lock(&state.snapshot)?;
    snapshot.upsert_case(case);

    let assigned = snapshot
        .assignment
        .as_ref()
        .and_then(|run| run.cases.iter().find(|c| c.id == id))
        .and_then(|c| c.assigned_hospital.clone());
    drop(snapshot);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "case_id": id,
        "assigned_hospital": assigned
    })))
}

async fn get_assignments(
    query: web::Query<AssignmentQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let snapshot = lock(&state.snapshot)?;
    let cases: Vec<Case> = match snapshot.assignment.as_ref() {
        Some(run) if query.sort.as_deref() == Some("severity") => sort_by_severity(&run.cases),
        Some(run) => run.cases.clone(),
        None => Vec::new(),
    };
    Ok(HttpResponse::Ok().json(cases))
}

async fn get_hospitals(state: web::Data<AppState>) -> Result<HttpResponse> {
    let snapshot = lock(&state.snapshot)?;
    let run = snapshot.assignment.as_ref();
    let views: Vec<HospitalView> = snapshot
        .hospitals
        .iter()
        .map(|hospital| HospitalView {
            occupancy: occupancy(hospital),
            incoming: run.map(|r| r.committed_to(&hospital.id)).unwrap_or(0),
            hospital: hospital.clone(),
        })
        .collect();
    Ok(HttpResponse::Ok().json(views))
}

// Stats endpoint
async fn get_stats(state: web::Data<AppState>) -> Result<HttpResponse> {
    let snapshot = lock(&state.snapshot)?;

    if let Some(ref run) = snapshot.assignment {
        let mut severity_counts: BTreeMap<String, u32> = BTreeMap::new();
        let mut place_counts: BTreeMap<String, u32> = BTreeMap::new();
        let mut hospital_counts: BTreeMap<String, u32> = BTreeMap::new();
        let mut unassigned = 0;

        for case in &run.cases {
            *severity_counts.entry(case.severity.label().to_string()).or_insert(0) += 1;
            *place_counts.entry(case.place.clone()).or_insert(0) += 1;
            match &case.assigned_hospital {
                Some(id) => *hospital_counts.entry(id.clone()).or_insert(0) += 1,
                None => unassigned += 1,
            }
        }

        Ok(HttpResponse::Ok().json(StatsResponse {
            severity_counts,
            place_counts,
            hospital_counts,
            unassigned,
        }))
    } else {
        Ok(HttpResponse::NotFound().json(serde_json::json!({"error": "No data available"})))
    }
}

async fn health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({"status": "ok"})))
}

/// Registers every route; shared by the server and tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/api/cases", web::post().to(upload_cases))
        .route("/api/hospitals", web::post().to(upload_hospitals))
        .route("/api/hospitals", web::get().to(get_hospitals))
        .route("/api/incidents", web::post().to(post_incident))
        .route("/api/assignments", web::get().to(get_assignments))
        .route("/api/stats", web::get().to(get_stats));
}

pub async fn start_server(port: u16, city_center: (f64, f64)) -> std::io::Result<()> {
    let app_state = web::Data::new(AppState::new(city_center));

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
