use gbind::{
    error::{glib_domains, FILE_DOMAIN},
    Result,
};

mod common;

#[test]
fn glib_domains_are_named() -> Result {
    let Some(glib) = common::glib() else {
        return Ok(());
    };

    let registry = glib_domains(glib);
    let file = registry.domain_id(FILE_DOMAIN).expect("the file domain is registered");
    assert_ne!(file, 0);
    assert_eq!(registry.domain_name(file).as_deref(), Some(FILE_DOMAIN));
    assert_eq!(registry.domain_name(u32::MAX), None);
    Ok(())
}
