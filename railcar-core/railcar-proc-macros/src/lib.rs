mod imports;
use imports::*;
mod history_vec_derive;
mod serde_api_derive;

#[proc_macro_error]
#[proc_macro_derive(HistoryVec)]
/// Generate HistoryVec that acts like a vec of states but
/// stores each field of state as a vec field.
pub fn history_vec_derive(input: TokenStream) -> TokenStream {
    history_vec_derive::history_vec_derive(input)
}

#[proc_macro_error]
#[proc_macro_derive(SerdeAPI)]
/// macro for deriving default implementation of SerdeAPI trait
pub fn serde_api_derive(item: TokenStream) -> TokenStream {
    serde_api_derive::serde_api_derive(item)
}
