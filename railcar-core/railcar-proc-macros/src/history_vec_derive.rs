use crate::imports::*;

pub(crate) fn history_vec_derive(input: TokenStream) -> TokenStream {
    let item_struct = syn::parse_macro_input!(input as syn::ItemStruct);
    let original_name = &item_struct.ident;
    let original_name_str: String = original_name.to_string();
    let new_name = Ident::new(
        &format!("{}HistoryVec", original_name.to_token_stream()),
        original_name.span(),
    );
    let fields = match &item_struct.fields {
        syn::Fields::Named(named) => &named.named,
        _ => abort_call_site!("`HistoryVec` can only be derived for structs with named fields."),
    };
    let field_names = fields
        .iter()
        .map(|f| f.ident.as_ref().unwrap())
        .collect::<Vec<_>>();
    if field_names.is_empty() {
        abort_call_site!("`HistoryVec` requires at least one field.");
    }
    let first_field = &field_names[0];
    let vec_fields: TokenStream2 = fields
        .iter()
        .map(|f| {
            let ident = f.ident.as_ref().unwrap();
            let ty = &f.ty;
            let docs = f
                .attrs
                .iter()
                .filter(|attr| attr.path.is_ident("doc"))
                .collect::<Vec<&syn::Attribute>>();
            quote! {
                #(#docs)*
                pub #ident: Vec<#ty>,
            }
        })
        .collect();
    let mut generated = TokenStream2::new();
    let struct_doc = format!("Stores history of [{original_name_str}]");
    let push_doc = format!("Pushes fields of [{original_name_str}] onto each field vec");
    let state_vec_doc = format!("Return history as vec of [{original_name_str}]");
    generated.append_all(quote! {
        #[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
        #[doc = #struct_doc]
        pub struct #new_name {
            #vec_fields
        }

        impl SerdeAPI for #new_name { }

        impl #new_name {
            /// Creates new empty vec container
            pub fn new() -> #new_name {
                Self::default()
            }

            #[doc = #push_doc]
            pub fn push(&mut self, state: #original_name) {
                #(self.#field_names.push(state.#field_names.clone());)*
            }

            /// Clear all history vecs
            pub fn clear(&mut self) {
                #(self.#field_names.clear();)*
            }

            /// Returns len of contained vectors
            pub fn len(&self) -> usize {
                self.#first_field.len()
            }

            /// Returns true if contained vecs are empty
            pub fn is_empty(&self) -> bool {
                self.#first_field.is_empty()
            }

            #[doc = #state_vec_doc]
            pub fn state_vec(&self) -> Vec<#original_name> {
                (0..self.len())
                    .map(|i| #original_name {
                        #(#field_names: self.#field_names[i].clone(),)*
                    })
                    .collect()
            }
        }
    });
    generated.into()
}
