mod request;
mod response;

pub use request::{ModulesQuery, RoiRequest, RunRequest, SelectModuleRequest, StaticMapBody};
pub use response::{
    DeleteResponse, HealthResponse, ModuleResponse, ModuleSelectionResponse, RoiResponse, RunResponse,
    SessionResponse,
};
