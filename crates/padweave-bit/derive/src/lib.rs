mod derive;

use proc_macro::TokenStream;

use crate::derive::handle_derive_bit;

/// Implements `padweave_bit_mask::Bitable`, assigning bits in declaration order.
#[proc_macro_derive(Bit)]
pub fn derive_bit(input: TokenStream) -> TokenStream {
    handle_derive_bit(input)
}
