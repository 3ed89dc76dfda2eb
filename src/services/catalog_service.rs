use crate::{
    catalog::Game,
    dto::catalog::GameResponse,
    error::ServiceError,
    state::SharedState,
};

/// Every game of the catalog, in declaration order.
pub fn list_games(state: &SharedState) -> Vec<GameResponse> {
    state.catalog().games().map(GameResponse::from).collect()
}

/// One game, or not found.
pub fn get_game(state: &SharedState, game_id: &str) -> Result<GameResponse, ServiceError> {
    require_game(state, game_id).map(GameResponse::from)
}

/// Look a game up in the catalog, failing with a not-found error.
pub fn require_game<'a>(state: &'a SharedState, game_id: &str) -> Result<&'a Game, ServiceError> {
    state
        .catalog()
        .get(game_id)
        .ok_or_else(|| ServiceError::NotFound(format!("game `{game_id}` not found")))
}
