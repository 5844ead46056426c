use std::sync::Arc;

use actix_web::{
    HttpResponse, Result,
    http::Method,
    middleware::DefaultHeaders,
    web,
};
use solana_sdk::pubkey::Pubkey;

use crate::builder::{build, into_post_response};
use crate::dto::{ActionPostRequest, TransferQuery};
use crate::error::{ActionError, DiscoveryError};
use crate::response::*;
use crate::reward::RewardMintDispatcher;
use crate::rpc::ChainRpc;
use crate::validate::validate;

pub const TRANSFER_PATH: &str = "/api/actions/transfer-sol";

const TITLE: &str = "Do you want to buy some TIGAS?";
const ICON: &str = "https://crimson-legislative-pigeon-962.mypinata.cloud/ipfs/QmdHLynShvCjVitoPxxG7ob8YxbbVuSAgQ3bAscj4XnfHb";
const DESCRIPTION: &str =
    "Create Account for your wallet for your TIGA (or TIGAS) and buy one doggy for yourself!";
const LABEL: &str = "Buy TIGAS";

pub struct AppState {
    pub rpc: Arc<dyn ChainRpc>,
    pub dispatcher: RewardMintDispatcher,
    pub default_recipient: Pubkey,
    pub base_url: String,
}

async fn get_actions_json() -> HttpResponse {
    HttpResponse::Ok().json(ActionsJson::standard())
}

async fn get_transfer_sol(
    state: web::Data<AppState>,
    query: web::Query<TransferQuery>,
) -> Result<HttpResponse, DiscoveryError> {
    let params = validate(
        query.to.as_deref(),
        query.amount.as_deref(),
        &state.default_recipient,
    )
    .inspect_err(|e| log::error!("discovery request rejected: {}", e))?;

    let base_href = format!(
        "{}{}?to={}",
        state.base_url, TRANSFER_PATH, params.recipient
    );
    let preset = |amount: u32, label: &str| LinkedAction {
        label: label.to_string(),
        href: format!("{}&amount={}", base_href, amount),
        parameters: Vec::new(),
    };

    let payload = ActionGetResponse {
        kind: "action",
        title: TITLE.to_string(),
        icon: ICON.to_string(),
        description: DESCRIPTION.to_string(),
        label: LABEL.to_string(),
        links: ActionLinks {
            actions: vec![
                preset(1, "Buy 1 TIGA"),
                preset(5, "Buy 5 TIGAS"),
                preset(10, "Buy 10 TIGAS"),
                LinkedAction {
                    label: LABEL.to_string(),
                    href: format!("{}&amount={{amount}}", base_href),
                    parameters: vec![ActionParameter {
                        name: "amount".to_string(),
                        label: "Enter the amount of TIGAS to buy".to_string(),
                        required: true,
                    }],
                },
            ],
        },
    };

    Ok(HttpResponse::Ok().json(payload))
}

async fn post_transfer_sol(
    state: web::Data<AppState>,
    query: web::Query<TransferQuery>,
    req: web::Json<ActionPostRequest>,
) -> Result<HttpResponse, ActionError> {
    let params = validate(
        query.to.as_deref(),
        query.amount.as_deref(),
        &state.default_recipient,
    )?;

    let (transaction, message) = build(state.rpc.as_ref(), &params, req.account.as_deref())
        .await
        .inspect_err(|e| log::warn!("transfer request rejected: {}", e))?;
    let payload = into_post_response(&transaction, message)?;

    // The response no longer depends on anything below.
    state.dispatcher.dispatch(&params, transaction.fee_payer);

    Ok(HttpResponse::Ok().json(payload))
}

async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}

pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add(("Access-Control-Allow-Methods", "GET,POST,PUT,OPTIONS"))
        .add((
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization, Content-Encoding, Accept-Encoding, X-Accept-Action-Version, X-Accept-Blockchain-Ids",
        ))
        .add((
            "Access-Control-Expose-Headers",
            "X-Action-Version, X-Blockchain-Ids",
        ))
}

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        actix_web::error::InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(ErrorBody::new(
                "Invalid JSON format or missing required fields".to_string(),
            )),
        )
        .into()
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/actions.json")
            .route(web::get().to(get_actions_json))
            .route(web::method(Method::OPTIONS).to(preflight)),
    )
    .service(
        web::resource(TRANSFER_PATH)
            .route(web::get().to(get_transfer_sol))
            .route(web::post().to(post_transfer_sol))
            .route(web::method(Method::OPTIONS).to(preflight)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reward::{QUEUE_CAPACITY, RewardMinter};
    use crate::rpc::mock::MockRpc;
    use actix_web::{App, http::StatusCode, test};
    use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
    use serde_json::{Value, json};
    use solana_sdk::{native_token::LAMPORTS_PER_SOL, signature::Keypair, transaction::Transaction};
    use std::time::Duration;

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .wrap(cors_headers())
                    .app_data(json_config())
                    .app_data(web::Data::new($state))
                    .configure(configure),
            )
            .await
        };
    }

    fn state(rpc: Arc<MockRpc>, dispatcher: RewardMintDispatcher) -> AppState {
        AppState {
            rpc,
            dispatcher,
            default_recipient: Pubkey::new_unique(),
            base_url: "http://localhost:8080".to_string(),
        }
    }

    #[actix_web::test]
    async fn actions_json_lists_routing_rules() {
        let app = app!(state(Arc::new(MockRpc::default()), RewardMintDispatcher::disabled()));
        let req = test::TestRequest::get().uri("/actions.json").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["rules"][0]["pathPattern"], "/*");
        assert_eq!(body["rules"][0]["apiPath"], "/api/actions/*");
        assert_eq!(body["rules"][1]["pathPattern"], "/api/actions/**");
    }

    #[actix_web::test]
    async fn discovery_payload_links_back_to_post_endpoint() {
        let app_state = state(Arc::new(MockRpc::default()), RewardMintDispatcher::disabled());
        let recipient = app_state.default_recipient;
        let app = app!(app_state);

        let req = test::TestRequest::get().uri(TRANSFER_PATH).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["type"], "action");
        assert_eq!(body["title"], TITLE);
        let actions = body["links"]["actions"].as_array().unwrap();
        assert_eq!(actions.len(), 4);

        let base = format!("http://localhost:8080{}?to={}", TRANSFER_PATH, recipient);
        assert_eq!(actions[0]["href"], format!("{}&amount=1", base));
        assert_eq!(actions[1]["href"], format!("{}&amount=5", base));
        assert_eq!(actions[2]["href"], format!("{}&amount=10", base));
        assert_eq!(actions[3]["href"], format!("{}&amount={{amount}}", base));
        assert_eq!(actions[3]["parameters"][0]["name"], "amount");
        assert_eq!(actions[3]["parameters"][0]["required"], true);
        assert!(actions[0].get("parameters").is_none());
    }

    #[actix_web::test]
    async fn discovery_with_bad_recipient_is_server_error() {
        let app = app!(state(Arc::new(MockRpc::default()), RewardMintDispatcher::disabled()));
        let req = test::TestRequest::get()
            .uri("/api/actions/transfer-sol?to=garbage")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Invalid input query parameter: to");
    }

    #[actix_web::test]
    async fn post_returns_unsigned_transfer() {
        let rpc = Arc::new(MockRpc::default());
        let app = app!(state(rpc.clone(), RewardMintDispatcher::disabled()));
        let to = Pubkey::new_unique();
        let account = Pubkey::new_unique();

        let req = test::TestRequest::post()
            .uri(&format!("{}?to={}&amount=1", TRANSFER_PATH, to))
            .set_json(json!({ "account": account.to_string() }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], format!("Send 1 SOL to {}", to));

        let bytes = BASE64.decode(body["transaction"].as_str().unwrap()).unwrap();
        let tx: Transaction = bincode::deserialize(&bytes).unwrap();
        assert_eq!(tx.message.account_keys[0], account);
        assert_eq!(tx.message.instructions.len(), 1);
        let expected = solana_sdk::system_instruction::transfer(&account, &to, LAMPORTS_PER_SOL);
        assert_eq!(tx.message.instructions[0].data, expected.data);
    }

    #[actix_web::test]
    async fn post_rejections_are_bad_requests() {
        let app = app!(state(Arc::new(MockRpc::default()), RewardMintDispatcher::disabled()));
        let account = Pubkey::new_unique().to_string();

        let cases = [
            (format!("{}?amount=1", TRANSFER_PATH), json!({})),
            (format!("{}?amount=0.001", TRANSFER_PATH), json!({ "account": account })),
            (format!("{}?to=bad", TRANSFER_PATH), json!({ "account": account })),
            (TRANSFER_PATH.to_string(), json!({ "account": "bad" })),
        ];

        for (uri, body) in cases {
            let req = test::TestRequest::post().uri(&uri).set_json(body).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
            let body: Value = test::read_body_json(resp).await;
            assert!(body["error"].is_string());
        }
    }

    #[actix_web::test]
    async fn post_without_account_reports_missing_source() {
        let app = app!(state(Arc::new(MockRpc::default()), RewardMintDispatcher::disabled()));
        let req = test::TestRequest::post()
            .uri(TRANSFER_PATH)
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid \"account\" provided");
    }

    #[actix_web::test]
    async fn malformed_json_body_is_bad_request() {
        let app = app!(state(Arc::new(MockRpc::default()), RewardMintDispatcher::disabled()));
        let req = test::TestRequest::post()
            .uri(TRANSFER_PATH)
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid JSON format or missing required fields");
    }

    #[actix_web::test]
    async fn network_outage_is_bad_request() {
        let rpc = Arc::new(MockRpc {
            fail_blockhash: true,
            ..MockRpc::default()
        });
        let app = app!(state(rpc, RewardMintDispatcher::disabled()));
        let req = test::TestRequest::post()
            .uri(TRANSFER_PATH)
            .set_json(json!({ "account": Pubkey::new_unique().to_string() }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn failed_mint_does_not_change_post_response() {
        let rpc = Arc::new(MockRpc {
            fail_send: true,
            ..MockRpc::default()
        });
        let recipient = Pubkey::new_unique();
        let account = Pubkey::new_unique();
        let uri = format!("{}?to={}&amount=2", TRANSFER_PATH, recipient);
        let body = json!({ "account": account.to_string() });

        let baseline = app!(state(rpc.clone(), RewardMintDispatcher::disabled()));
        let req = test::TestRequest::post().uri(&uri).set_json(&body).to_request();
        let expected: Value = test::call_and_read_body_json(&baseline, req).await;

        let minter = RewardMinter::new(
            rpc.clone(),
            Pubkey::new_unique(),
            Arc::new(Keypair::new()),
            "devnet".to_string(),
        );
        let with_mint = app!(state(
            rpc.clone(),
            RewardMintDispatcher::start(minter, QUEUE_CAPACITY)
        ));
        let req = test::TestRequest::post().uri(&uri).set_json(&body).to_request();
        let resp = test::call_service(&with_mint, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let actual: Value = test::read_body_json(resp).await;
        assert_eq!(actual, expected);

        // the worker still ran and hit the failing send
        for _ in 0..100 {
            if rpc.calls().contains(&"sendTransaction") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(rpc.calls().contains(&"sendTransaction"));
        assert!(rpc.sent.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn preflight_carries_cors_headers() {
        let app = app!(state(Arc::new(MockRpc::default()), RewardMintDispatcher::disabled()));
        let req = test::TestRequest::default()
            .method(Method::OPTIONS)
            .uri(TRANSFER_PATH)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Methods").unwrap(),
            "GET,POST,PUT,OPTIONS"
        );
    }
}
