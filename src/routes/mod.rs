pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;

use actix_web::web;

/// Wires every handler under the guarded `/api` scope. `search` is
/// registered before the `{key}` lookup so it is not swallowed by the
/// path parameter.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::signup)
        .service(auth::login)
        .service(auth::logout)
        .service(users::profile)
        .service(users::change_password)
        .service(
            web::scope("/tasks")
                .service(tasks::search_tasks)
                .service(tasks::list_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        );
}
