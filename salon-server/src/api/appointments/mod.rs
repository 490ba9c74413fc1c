//! Appointment API
//!
//! | Path | Method | Operation |
//! |------|--------|-----------|
//! | /api/appointments | POST | book |
//! | /api/appointments | GET | calendar feed |
//! | /api/appointments/{id} | GET | fetch |
//! | /api/appointments/{id} | PATCH | partial update |
//! | /api/appointments/{id} | DELETE | delete |
//! | /api/appointments/{id}/time | PUT | reschedule |
//! | /api/appointments/{id}/status | PUT | status change / completion |
//! | /api/appointments/{id}/cancel | POST | cancel |
//! | /api/appointments/{id}/payment-intent | POST | register card payment |

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/appointments", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .patch(handler::update)
                .delete(handler::delete),
        )
        .route("/{id}/time", put(handler::reschedule))
        .route("/{id}/status", put(handler::change_status))
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/payment-intent", post(handler::register_payment_intent))
}
