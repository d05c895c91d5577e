mod header;
mod query;

use http::request::Parts;
use http::Request;
use iwopsign_core::time::parse_rfc2822;
use iwopsign_core::{Context, SignRequest, SignatureMode};
use iwopsign_gateway::{Credential, RequestSigner};

const SIGNING_TIME: &str = "Mon, 15 Aug 2022 16:50:12 GMT";

fn credential() -> Credential {
    Credential::new("iwop-access-id", "123456")
}

/// Signer with the clock pinned to [`SIGNING_TIME`].
fn signer() -> RequestSigner {
    let _ = env_logger::builder().is_test(true).try_init();

    RequestSigner::new().with_time(parse_rfc2822(SIGNING_TIME).expect("signing time must parse"))
}

async fn sign(req: Request<()>, mode: SignatureMode) -> iwopsign_core::Result<Parts> {
    let (mut parts, _) = req.into_parts();
    signer()
        .sign_request(&Context::new(), &mut parts, Some(&credential()), mode)
        .await?;
    Ok(parts)
}
