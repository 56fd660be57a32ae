//! OpenAPI document for the REST surface.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::dto::{
    CreateSlotRequest, DashboardResponse, PaginationMeta, ProposeSwapRequest, RespondSwapRequest,
    SlotDto, SlotListResponse, SwapRequestDto, SwapRequestListResponse, UpdateSlotStatusRequest,
};
use crate::api::handlers::system::HealthResponse;
use crate::api::handlers::{slot, swap, system};
use crate::domain::{ProposalId, SlotId, SlotStatus, SwapStatus, UserId};
use crate::error::{ErrorBody, ErrorResponse};

/// Generated OpenAPI document, served at `/api-docs/openapi.json`.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "slotswap-gateway", description = "Trade scheduled time slots between users."),
    paths(
        slot::create_slot,
        slot::list_my_slots,
        slot::update_slot_status,
        slot::delete_slot,
        slot::list_swappable_slots,
        swap::propose_swap,
        swap::respond_to_swap,
        swap::list_swap_requests,
        swap::get_swap_request,
        swap::dashboard,
        system::health_handler,
    ),
    components(schemas(
        CreateSlotRequest,
        UpdateSlotStatusRequest,
        SlotDto,
        SlotListResponse,
        ProposeSwapRequest,
        RespondSwapRequest,
        SwapRequestDto,
        SwapRequestListResponse,
        DashboardResponse,
        PaginationMeta,
        HealthResponse,
        ErrorResponse,
        ErrorBody,
        SlotStatus,
        SwapStatus,
        SlotId,
        ProposalId,
        UserId,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Slots", description = "Create and manage your own slots"),
        (name = "Swaps", description = "Propose, answer, and inspect swap requests"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` JWT security scheme referenced by the handlers.
#[derive(Debug)]
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/slots",
            "/api/v1/slots/{id}",
            "/api/v1/swappable-slots",
            "/api/v1/swap-requests",
            "/api/v1/swap-requests/{id}",
            "/api/v1/swap-requests/{id}/response",
            "/api/v1/dashboard",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        assert!(
            doc.components
                .is_some_and(|c| c.security_schemes.contains_key("bearer"))
        );
    }
}
