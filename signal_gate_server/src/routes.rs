//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Both webhook endpoints answer `200 OK` no matter what happened inside. The affiliate network retries non-2xx
//! deliveries, and a retry of a malformed postback is still malformed; Telegram likewise re-delivers updates
//! until it sees a 2xx, and a poison update must not wedge the queue. Failures are carried in the response body
//! (postbacks) or just logged (chat updates).
use std::str::FromStr;

use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use serde_json::json;
use sg_common::UsdCents;
use signal_gate_engine::{
    db_types::{DepositEvent, EventKind},
    traits::{SignalGateDatabase, VerificationBackend},
    PostbackApi,
};
use telegram_tools::{MessageGateway, Update};

use crate::{
    data_objects::{PostbackAuth, PostbackQuery, PostbackResponse},
    dispatcher::UpdateDispatcher,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ---------------------------------------------- Postback  ----------------------------------------------------
route!(postback => Get "/postback" impl SignalGateDatabase);

/// Affiliate postback ingestion. The contract with the network is "always 200"; outcomes and errors travel in
/// the JSON body's `status` field.
pub async fn postback<B: SignalGateDatabase>(
    query: web::Query<PostbackQuery>,
    api: web::Data<PostbackApi<B>>,
    auth: web::Data<PostbackAuth>,
) -> HttpResponse {
    let query = query.into_inner();
    if !auth.accepts(query.token.as_deref()) {
        warn!("📬️ Rejecting postback with a missing or invalid token");
        return HttpResponse::Ok().json(PostbackResponse::error("invalid token"));
    }
    let Some(account_id) = query.account_id.filter(|id| !id.trim().is_empty()) else {
        warn!("📬️ Postback arrived without an account_id");
        return HttpResponse::Ok().json(PostbackResponse::error("missing account_id"));
    };
    let kind = match query.event_kind.as_deref().map(EventKind::from_str) {
        Some(Ok(kind)) => kind,
        Some(Err(_)) | None => {
            // Unknown event types are acknowledged and dropped, same as the networks expect.
            debug!("📬️ Ignoring postback with event kind {:?}", query.event_kind);
            return HttpResponse::Ok().json(PostbackResponse::error("ignored"));
        },
    };
    // A missing or garbled amount is treated as zero rather than dropping the event; a registration with no
    // amount is the common case.
    let amount = query
        .amount
        .as_deref()
        .map(|a| {
            UsdCents::from_str(a).unwrap_or_else(|e| {
                warn!("📬️ Could not parse postback amount {a}: {e}. Defaulting to zero.");
                UsdCents::default()
            })
        })
        .unwrap_or_default();
    let mut event = DepositEvent::new(account_id, amount, kind);
    if let Some(event_id) = query.event_id.filter(|id| !id.trim().is_empty()) {
        event = event.with_event_id(event_id);
    }
    match api.process_event(event).await {
        Ok(outcome) => {
            info!(
                "📬️ Postback {:?} for account {}: total now {}",
                outcome.status, outcome.record.account_id, outcome.record.total_deposit
            );
            HttpResponse::Ok().json(PostbackResponse::from(outcome))
        },
        Err(e) => {
            error!("📬️ Could not process postback: {e}");
            HttpResponse::Ok().json(PostbackResponse::error(e.to_string()))
        },
    }
}

// ----------------------------------------------  Webhook  ----------------------------------------------------
route!(webhook => Post "/webhook" impl VerificationBackend, MessageGateway);

/// Telegram update intake. Acks immediately and hands the update to a detached task, so slow outbound sends
/// (animations sleep between frames) never hold up the webhook.
pub async fn webhook<B, G>(
    update: web::Json<Update>,
    dispatcher: web::Data<UpdateDispatcher<B, G>>,
) -> HttpResponse
where
    B: VerificationBackend + 'static,
    G: MessageGateway + 'static,
{
    let update = update.into_inner();
    trace!("✈️ Received update {}", update.update_id);
    let dispatcher = dispatcher.clone();
    actix_web::rt::spawn(async move {
        dispatcher.handle_update(update).await;
    });
    HttpResponse::Ok().json(json!({"ok": true}))
}
