use super::*;

#[test]
fn trace_macros_compile() {
    let token = "cat";
    trace!(token = token, "scan");
    debug!("predict");
    info!("parse finished");

    let _entered = debug_span!("concretize").entered();
}

#[test]
fn init_subscriber_is_idempotent() {
    init_subscriber();
    init_subscriber();
}
