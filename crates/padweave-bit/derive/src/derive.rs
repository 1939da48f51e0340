use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Error, Fields};

const MAX_FLAGS: usize = 64;

pub(crate) fn handle_derive_bit(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let Data::Enum(data) = &input.data else {
        return Error::new_spanned(name, "Bit can be derived only for enums")
            .to_compile_error()
            .into();
    };

    let mut variants = Vec::with_capacity(data.variants.len());
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Error::new_spanned(variant, "Bit supports only fieldless variants")
                .to_compile_error()
                .into();
        }
        variants.push(&variant.ident);
    }
    if variants.len() > MAX_FLAGS {
        return Error::new_spanned(name, "Bit supports at most 64 variants")
            .to_compile_error()
            .into();
    }

    let bit_arms = variants.iter().enumerate().map(|(i, v)| {
        let idx = i as u64;
        quote! { #name::#v => 1u64 << #idx }
    });
    let index_arms = variants.iter().enumerate().map(|(i, v)| {
        let idx = i as u32;
        quote! { #name::#v => #idx }
    });

    let expanded = quote! {
        impl ::padweave_bit_mask::Bitable for #name {
            #[inline]
            fn bit(&self) -> u64 {
                match self { #( #bit_arms, )* }
            }

            #[inline]
            fn index(&self) -> u32 {
                match self { #( #index_arms, )* }
            }
        }
    };

    TokenStream::from(expanded)
}
