// Application state for HTTP handlers
use crate::application::qualifying_service::QualifyingService;
use crate::application::replay_service::ReplayService;
use crate::application::schedule_service::ScheduleService;

#[derive(Clone)]
pub struct AppState {
    pub replay_service: ReplayService,
    pub qualifying_service: QualifyingService,
    pub schedule_service: ScheduleService,
}
