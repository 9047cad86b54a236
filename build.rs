use rustc_version::{version_meta, Channel};

fn main() {
    println!("cargo::rustc-check-cfg=cfg(docsrs)");

    // enable docsrs cfg flag in nightly channel builds
    // used for #![cfg_attr(all(doc, docsrs), feature(doc_auto_cfg))]
    if let Ok(meta) = version_meta() {
        if meta.channel == Channel::Nightly {
            println!("cargo::rustc-cfg=docsrs");
        }
    }
}
