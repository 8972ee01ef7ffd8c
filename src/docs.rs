use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::users::users_gateway,
        crate::api::balance::balance_gateway,
        crate::api::admins::admins_gateway
    ),
    components(
        schemas(
            crate::api::payments::InitiatePaymentRequest,
            crate::api::support::CreateTicketRequest,
            crate::api::balance::DepositRequest,
            crate::api::admins::CreateAdminRequest
        )
    ),
    tags(
        (name = "storefront", description = "Bot webhook, auth, payments, support tickets"),
        (name = "balance", description = "User balance and transactions"),
        (name = "admins", description = "Administrator management")
    )
)]
pub struct ApiDoc;
