use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, Ident, ItemFn, LitStr};

const USAGE: &str = "rxpush_macro::test only accepts: #[rxpush_macro::test], \
                     #[rxpush_macro::test(local)], #[rxpush_macro::test(shared)], or string \
                     equivalents";

/// Test attribute shared by the unit and integration suites.
///
/// Sync functions become plain `#[test]`s. Async functions run on tokio:
/// `local` selects the current-thread runtime and `shared` the multi-thread
/// one.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let input = parse_macro_input!(item as ItemFn);
  let is_async = input.sig.asyncness.is_some();

  let raw_args = proc_macro2::TokenStream::from(attr);
  let flavor = if raw_args.is_empty() {
    None
  } else {
    if !is_async {
      return TokenStream::from(
        syn::Error::new(
          raw_args.span(),
          "rxpush_macro::test flavor args are only supported for async tests",
        )
        .to_compile_error(),
      );
    }

    let name = if let Ok(ident) = syn::parse2::<Ident>(raw_args.clone()) {
      (ident.to_string(), ident.span())
    } else if let Ok(lit) = syn::parse2::<LitStr>(raw_args.clone()) {
      (lit.value(), lit.span())
    } else {
      return TokenStream::from(syn::Error::new(raw_args.span(), USAGE).to_compile_error());
    };

    match name.0.as_str() {
      "local" => Some(quote!(flavor = "current_thread")),
      "shared" => Some(quote!(flavor = "multi_thread")),
      _ => return TokenStream::from(syn::Error::new(name.1, USAGE).to_compile_error()),
    }
  };

  let attr = match (is_async, flavor) {
    (false, _) => quote!(#[test]),
    (true, None) => quote!(#[tokio::test]),
    (true, Some(flavor)) => quote!(#[tokio::test(#flavor)]),
  };

  TokenStream::from(quote! {
    #attr
    #input
  })
}
