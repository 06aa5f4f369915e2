use crate::sentinel::Sentinel;

#[derive(Clone)]
pub struct AppState {
    pub sentinel: Sentinel,
}
