//! Bidding Router
//!
//! Every mutating route carries an [`AccessRule`] route layer: role
//! allow-list first, then the permissions the caller must hold. The caller
//! itself is resolved by the authentication layer the application wraps
//! around these routers.

use axum::{
    Router, middleware,
    routing::{MethodRouter, delete, get, patch, post},
};
use kernel::access::{AccessRule, enforce_access};
use kernel::actor::{Permission, Role};

use crate::domain::repository::{BiddingStore, Notifier};
use crate::presentation::handlers::{self, BiddingAppState};

fn guard<S>(route: MethodRouter<S>, rule: AccessRule) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.route_layer(middleware::from_fn_with_state(rule, enforce_access))
}

fn owner_rule(permission: Permission) -> AccessRule {
    AccessRule::roles([Role::Admin, Role::PublicEntity]).require([permission])
}

fn supplier_rule() -> AccessRule {
    AccessRule::roles([Role::Supplier]).require([Permission::SubmitProposal])
}

/// `/api/biddings`: reads are open to anonymous callers
pub fn bidding_router<R, N>(state: BiddingAppState<R, N>) -> Router
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/",
            get(handlers::list_biddings::<R, N>).merge(guard(
                post(handlers::create_bidding::<R, N>),
                owner_rule(Permission::CreateBidding),
            )),
        )
        .route(
            "/{id}",
            get(handlers::get_bidding::<R, N>)
                .merge(guard(
                    patch(handlers::update_bidding::<R, N>),
                    owner_rule(Permission::UpdateBidding),
                ))
                .merge(guard(
                    delete(handlers::delete_bidding::<R, N>),
                    owner_rule(Permission::DeleteBidding),
                )),
        )
        .route(
            "/{id}/publish",
            guard(
                post(handlers::publish_bidding::<R, N>),
                owner_rule(Permission::PublishBidding),
            ),
        )
        .route(
            "/{id}/cancel",
            guard(
                post(handlers::cancel_bidding::<R, N>),
                owner_rule(Permission::CancelBidding),
            ),
        )
        .route(
            "/{id}/moderate",
            guard(
                post(handlers::moderate_bidding::<R, N>),
                AccessRule::roles([Role::Admin]).require([Permission::ModerateBidding]),
            ),
        )
        .route(
            "/{id}/proposals",
            guard(
                get(handlers::list_proposals::<R, N>),
                AccessRule::authenticated(),
            )
            .merge(guard(
                post(handlers::create_proposal::<R, N>),
                supplier_rule(),
            )),
        )
        .route(
            "/{id}/contracts",
            guard(
                get(handlers::list_contracts::<R, N>),
                AccessRule::authenticated(),
            ),
        )
        .with_state(state)
}

/// `/api/proposals`
pub fn proposal_router<R, N>(state: BiddingAppState<R, N>) -> Router
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let evaluator = || owner_rule(Permission::EvaluateProposal);

    Router::new()
        .route(
            "/{id}",
            guard(
                get(handlers::get_proposal::<R, N>),
                AccessRule::authenticated(),
            )
            .merge(guard(
                patch(handlers::update_proposal::<R, N>)
                    .delete(handlers::delete_proposal::<R, N>),
                supplier_rule(),
            )),
        )
        .route(
            "/{id}/submit",
            guard(post(handlers::submit_proposal::<R, N>), supplier_rule()),
        )
        .route(
            "/{id}/withdraw",
            guard(post(handlers::withdraw_proposal::<R, N>), supplier_rule()),
        )
        .route(
            "/{id}/evaluate",
            guard(post(handlers::evaluate_proposal::<R, N>), evaluator()),
        )
        .route(
            "/{id}/accept",
            guard(post(handlers::accept_proposal::<R, N>), evaluator()),
        )
        .route(
            "/{id}/reject",
            guard(post(handlers::reject_proposal::<R, N>), evaluator()),
        )
        .with_state(state)
}

/// `/api/contracts`
pub fn contract_router<R, N>(state: BiddingAppState<R, N>) -> Router
where
    R: BiddingStore,
    N: Notifier + Send + Sync + 'static,
{
    let manager = || owner_rule(Permission::ManageContracts);

    Router::new()
        .route(
            "/",
            guard(post(handlers::create_contract::<R, N>), manager()),
        )
        .route(
            "/{id}",
            guard(
                get(handlers::get_contract::<R, N>),
                AccessRule::authenticated(),
            ),
        )
        // Parties are checked by the service
        .route(
            "/{id}/sign",
            guard(
                post(handlers::sign_contract::<R, N>),
                AccessRule::authenticated(),
            ),
        )
        .route(
            "/{id}/activate",
            guard(post(handlers::activate_contract::<R, N>), manager()),
        )
        .route(
            "/{id}/suspend",
            guard(post(handlers::suspend_contract::<R, N>), manager()),
        )
        .route(
            "/{id}/complete",
            guard(post(handlers::complete_contract::<R, N>), manager()),
        )
        .route(
            "/{id}/terminate",
            guard(post(handlers::terminate_contract::<R, N>), manager()),
        )
        .with_state(state)
}
